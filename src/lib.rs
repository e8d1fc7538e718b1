//! SMS gateway core
//!
//! Drives a cellular SMS appliance through its SSH management shell:
//! - `transport`: the device link seam and its SSH implementation
//! - `session`: per-operation session lifecycle with guaranteed release
//! - `gateway`: status, listing, clearing and sending operations
//! - `store`: message log persistence

pub mod config;
pub mod error;
pub mod gateway;
pub mod session;
pub mod store;
pub mod transport;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use config::{ConfigError, DeviceConfig, SessionTimeouts};
pub use error::GatewayError;
pub use gateway::GatewayOperations;
pub use session::{with_session, RemoteSession};
pub use store::{MemoryLogStore, MessageLogStore, SqliteLogStore};
pub use transport::{DeviceConnector, DeviceLink, SshConnector};
