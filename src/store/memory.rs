//! In-process message log

use super::MessageLogStore;
use anyhow::Result;
use async_trait::async_trait;
use sms_gateway_shared::{CallerId, MessageLogEntry, NewLogEntry};
use tokio::sync::RwLock;

/// Message log kept in memory; contents are lost on restart
#[derive(Debug, Default)]
pub struct MemoryLogStore {
    entries: RwLock<Vec<MessageLogEntry>>,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

fn newest_first(mut entries: Vec<MessageLogEntry>) -> Vec<MessageLogEntry> {
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
    entries
}

#[async_trait]
impl MessageLogStore for MemoryLogStore {
    async fn record(&self, entry: NewLogEntry) -> Result<i64> {
        let mut entries = self.entries.write().await;
        let id = entries.len() as i64 + 1;
        entries.push(MessageLogEntry::from_new(id, entry));
        Ok(id)
    }

    async fn history_for(&self, user_id: CallerId) -> Result<Vec<MessageLogEntry>> {
        let entries = self.entries.read().await;
        Ok(newest_first(
            entries
                .iter()
                .filter(|e| e.user_id == user_id)
                .cloned()
                .collect(),
        ))
    }

    async fn all(&self) -> Result<Vec<MessageLogEntry>> {
        Ok(newest_first(self.entries.read().await.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_record_and_filter() -> Result<()> {
        let store = MemoryLogStore::new();
        let first = store.record(NewLogEntry::sent(CallerId(1), "111", "a")).await?;
        let second = store.record(NewLogEntry::sent(CallerId(2), "222", "b")).await?;
        let third = store.record(NewLogEntry::sent(CallerId(1), "333", "c")).await?;
        assert_eq!((first, second, third), (1, 2, 3));

        let history = store.history_for(CallerId(1)).await?;
        let ids: Vec<_> = history.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![3, 1]);

        assert_eq!(store.len().await, 3);
        assert_eq!(store.all().await?.len(), 3);
        Ok(())
    }
}
