//! Reply decoding and parsing for device CLI output
//!
//! The device answers in freeform text. Only three shapes are interpreted:
//! - `sms count`: newline-stripped text compared against the literal `"0"`
//! - `sms list`: opaque listing, prefixed with the count banner
//! - status commands: trimmed verbatim into [`DeviceStatus`]

use thiserror::Error;

use crate::replies::NO_STORED_MESSAGES;
use crate::{DeviceStatus, LinkStatus};

/// Errors that can occur while decoding a device reply
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Reply {stream} is not valid UTF-8: {detail}")]
    InvalidUtf8 { stream: &'static str, detail: String },

    #[error("Command exited with status {status}: {message}")]
    NonZeroExit { status: u32, message: String },
}

/// Output of one device command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// Remote exit status, when the transport reported one
    pub exit_status: Option<u32>,
}

impl CommandOutput {
    /// Output with only stdout, as a successful command produces
    pub fn stdout(text: impl Into<String>) -> Self {
        Self {
            stdout: text.into(),
            stderr: String::new(),
            exit_status: Some(0),
        }
    }

    /// Decode raw reply streams, rejecting invalid UTF-8
    pub fn from_raw(
        stdout: &[u8],
        stderr: &[u8],
        exit_status: Option<u32>,
    ) -> Result<Self, ProtocolError> {
        let decode = |stream: &'static str, bytes: &[u8]| {
            String::from_utf8(bytes.to_vec()).map_err(|e| ProtocolError::InvalidUtf8 {
                stream,
                detail: e.to_string(),
            })
        };

        Ok(Self {
            stdout: decode("stdout", stdout)?,
            stderr: decode("stderr", stderr)?,
            exit_status,
        })
    }

    /// Fail on a reported non-zero exit status
    ///
    /// A missing exit status is accepted: the device CLI does not always
    /// report one before the channel closes.
    pub fn into_success(self) -> Result<Self, ProtocolError> {
        match self.exit_status {
            Some(status) if status != 0 => {
                let message = if self.stderr.trim().is_empty() {
                    self.stdout.trim().to_string()
                } else {
                    self.stderr.trim().to_string()
                };
                Err(ProtocolError::NonZeroExit { status, message })
            }
            _ => Ok(self),
        }
    }
}

/// Parsed reply of `sms count`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredCount {
    /// The device reported exactly `"0"`
    Empty,
    /// Anything else, carried verbatim (not validated as a number)
    Stored(String),
}

impl StoredCount {
    /// Parse by removing every newline and comparing against `"0"`
    pub fn parse(stdout: &str) -> Self {
        let count = stdout.replace('\n', "");
        if count == "0" {
            Self::Empty
        } else {
            Self::Stored(count)
        }
    }
}

/// Render the stored-message listing returned to callers
pub fn format_listing(count: &StoredCount, listing: &str) -> String {
    match count {
        StoredCount::Empty => NO_STORED_MESSAGES.to_string(),
        StoredCount::Stored(count) => format!("{} STORED MESSAGES:\n{}", count, listing),
    }
}

/// Assemble a status snapshot from the three status replies
pub fn status_from_replies(
    info: &CommandOutput,
    sim: &CommandOutput,
    temperature: &CommandOutput,
) -> DeviceStatus {
    DeviceStatus {
        device_info: info.stdout.trim().to_string(),
        sim_info: sim.stdout.trim().to_string(),
        temperature_info: temperature.stdout.trim().to_string(),
        status: LinkStatus::Online,
    }
}
