//! SMS Gateway Shared Protocol Types
//!
//! This crate provides the device command vocabulary, reply parsing, and the
//! value types exchanged between the gateway core and the HTTP server.

pub mod command;
pub mod reply;
pub mod types;

pub use command::DeviceCommand;
pub use reply::{CommandOutput, ProtocolError, StoredCount};
pub use types::*;

/// Fixed parameters of the device management path
pub mod device {
    /// Default SSH port on the device
    pub const DEFAULT_SSH_PORT: u16 = 22;

    /// Brings the cellular modem's network interface up (runs on the outer shell)
    pub const INTERFACE_UP_COMMAND: &str = "ifconfig usb0 up";

    /// File on the device holding the inner administrative address
    pub const INNER_ADDRESS_FILE: &str = "/var/run/topipv6";

    /// Management CLI binary reachable only through the inner hop
    pub const MANAGEMENT_CLI: &str = "/legato/systems/current/bin/cm";

    /// Connect + authenticate timeout in milliseconds
    pub const CONNECT_TIMEOUT_MS: u64 = 10_000;

    /// Per-command timeout in milliseconds
    pub const COMMAND_TIMEOUT_MS: u64 = 30_000;
}

/// Literal replies produced by the gateway
pub mod replies {
    pub const NO_STORED_MESSAGES: &str = "NO STORED MESSAGES";
    pub const MESSAGES_CLEARED: &str = "ALL STORED MESSAGES CLEARED";
    pub const MESSAGE_SENT: &str = "MESSAGE SENT";
}
