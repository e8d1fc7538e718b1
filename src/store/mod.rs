//! Message log storage
//!
//! The log records outbound messages per caller. It is owned outside the
//! device path: a failed write never undoes a device action.

mod memory;
mod sqlite;

pub use memory::MemoryLogStore;
pub use sqlite::SqliteLogStore;

use anyhow::Result;
use async_trait::async_trait;
use sms_gateway_shared::{CallerId, MessageLogEntry, NewLogEntry};

/// Persistence for message log entries
#[async_trait]
pub trait MessageLogStore: Send + Sync {
    /// Write one entry, returning its id
    async fn record(&self, entry: NewLogEntry) -> Result<i64>;

    /// Entries attributed to one caller, newest first
    async fn history_for(&self, user_id: CallerId) -> Result<Vec<MessageLogEntry>>;

    /// All entries, newest first
    async fn all(&self) -> Result<Vec<MessageLogEntry>>;
}
