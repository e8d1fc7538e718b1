//! Errors surfaced by gateway operations

use sms_gateway_shared::ProtocolError;
use thiserror::Error;

/// Failure of a gateway operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Transport or authentication failure while opening the session
    #[error("Connection to {host} failed: {reason}")]
    Connection { host: String, reason: String },

    /// Abnormal remote execution or undecodable reply
    #[error("Command '{command}' failed: {reason}")]
    Command { command: String, reason: String },

    /// Log write failed after a successful device action
    #[error("Failed to persist message log: {0}")]
    LogPersist(String),
}

impl GatewayError {
    pub fn connection(host: impl Into<String>, reason: impl ToString) -> Self {
        Self::Connection {
            host: host.into(),
            reason: reason.to_string(),
        }
    }

    pub fn command(command: impl Into<String>, reason: impl ToString) -> Self {
        Self::Command {
            command: command.into(),
            reason: reason.to_string(),
        }
    }

    /// Attach a command name to a reply decoding failure
    pub fn from_protocol(command: impl Into<String>, err: ProtocolError) -> Self {
        Self::command(command, err)
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
