//! SQLite-backed message log

use super::MessageLogStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, Row};
use sms_gateway_shared::{CallerId, DeliveryStatus, Direction, MessageLogEntry, NewLogEntry};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Message log stored in a SQLite database (thread-safe via Arc<Mutex>)
pub struct SqliteLogStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLogStore {
    /// Open (or create) the database and ensure the schema exists
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).context("Failed to open SQLite database")?;
        info!("Opening message log database at {:?}", path.as_ref());
        Self::init(conn)
    }

    /// In-memory database, for tests and throwaway deployments
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory SQLite")?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS sms_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                destination TEXT NOT NULL,
                body TEXT NOT NULL,
                direction TEXT NOT NULL,
                status TEXT NOT NULL,
                timestamp TEXT NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_sms_logs_user ON sms_logs(user_id)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_sms_logs_timestamp ON sms_logs(timestamp)",
            [],
        )?;

        debug!("Message log schema initialized");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn query(&self, user_id: Option<CallerId>) -> Result<Vec<MessageLogEntry>> {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap_or_else(|poisoned| {
                warn!("Database mutex was poisoned, recovering");
                poisoned.into_inner()
            });

            let entries = match user_id {
                Some(user_id) => {
                    let mut stmt = conn.prepare(
                        "SELECT id, user_id, destination, body, direction, status, timestamp
                         FROM sms_logs WHERE user_id = ?1
                         ORDER BY timestamp DESC, id DESC",
                    )?;
                    let rows = stmt.query_map(params![user_id.0], row_to_entry)?;
                    rows.collect::<rusqlite::Result<Vec<_>>>()?
                }
                None => {
                    let mut stmt = conn.prepare(
                        "SELECT id, user_id, destination, body, direction, status, timestamp
                         FROM sms_logs ORDER BY timestamp DESC, id DESC",
                    )?;
                    let rows = stmt.query_map([], row_to_entry)?;
                    rows.collect::<rusqlite::Result<Vec<_>>>()?
                }
            };
            Ok(entries)
        })
        .await
        .context("spawn_blocking task panicked")?
    }
}

fn conversion_error(column: usize, value: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        rusqlite::types::Type::Text,
        format!("unexpected value '{}'", value).into(),
    )
}

fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<MessageLogEntry> {
    let direction: String = row.get(4)?;
    let status: String = row.get(5)?;
    let timestamp: String = row.get(6)?;

    Ok(MessageLogEntry {
        id: row.get(0)?,
        user_id: CallerId(row.get(1)?),
        destination: row.get(2)?,
        body: row.get(3)?,
        direction: Direction::parse(&direction).ok_or_else(|| conversion_error(4, direction.clone()))?,
        status: DeliveryStatus::parse(&status).ok_or_else(|| conversion_error(5, status.clone()))?,
        timestamp: DateTime::parse_from_rfc3339(&timestamp)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|_| conversion_error(6, timestamp.clone()))?,
    })
}

#[async_trait]
impl MessageLogStore for SqliteLogStore {
    async fn record(&self, entry: NewLogEntry) -> Result<i64> {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap_or_else(|poisoned| {
                warn!("Database mutex was poisoned, recovering");
                poisoned.into_inner()
            });

            conn.execute(
                "INSERT INTO sms_logs (user_id, destination, body, direction, status, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    entry.user_id.0,
                    &entry.destination,
                    &entry.body,
                    entry.direction.as_str(),
                    entry.status.as_str(),
                    entry.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true),
                ],
            )
            .context("Failed to insert message log entry")?;

            let id = conn.last_insert_rowid();
            debug!("Recorded message log entry {} for user {}", id, entry.user_id);
            Ok(id)
        })
        .await
        .context("spawn_blocking task panicked")?
    }

    async fn history_for(&self, user_id: CallerId) -> Result<Vec<MessageLogEntry>> {
        self.query(Some(user_id)).await
    }

    async fn all(&self) -> Result<Vec<MessageLogEntry>> {
        self.query(None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_record_and_history() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = SqliteLogStore::open(dir.path().join("sms.db"))?;

        let mut older = NewLogEntry::sent(CallerId(1), "5550001", "first");
        older.timestamp = Utc::now() - Duration::minutes(5);
        let first = store.record(older).await?;
        let second = store.record(NewLogEntry::sent(CallerId(2), "5550002", "other")).await?;
        let third = store.record(NewLogEntry::sent(CallerId(1), "5550003", "latest")).await?;

        let history = store.history_for(CallerId(1)).await?;
        let ids: Vec<_> = history.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![third, first]);
        assert_eq!(history[0].body, "latest");
        assert_eq!(history[0].direction, Direction::Sent);
        assert_eq!(history[0].status, DeliveryStatus::Sent);

        let all = store.all().await?;
        assert_eq!(all.len(), 3);
        assert!(all.iter().any(|e| e.id == second));
        Ok(())
    }

    #[tokio::test]
    async fn test_entries_survive_reopen() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("sms.db");

        {
            let store = SqliteLogStore::open(&path)?;
            store.record(NewLogEntry::sent(CallerId(9), "123", "kept")).await?;
        }

        let reopened = SqliteLogStore::open(&path)?;
        let history = reopened.history_for(CallerId(9)).await?;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].destination, "123");
        Ok(())
    }

    #[tokio::test]
    async fn test_timestamp_round_trips_as_utc() -> Result<()> {
        let store = SqliteLogStore::open_in_memory()?;
        let entry = NewLogEntry::sent(CallerId(3), "1", "x");
        let written = entry.timestamp;
        store.record(entry).await?;

        let stored = store.all().await?;
        assert_eq!(stored[0].timestamp, written);
        Ok(())
    }
}
