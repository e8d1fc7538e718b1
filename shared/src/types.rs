//! Value types exchanged between the gateway core and its callers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::replies::MESSAGE_SENT;

/// Identity of an authenticated caller, used to attribute log entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallerId(pub i64);

impl fmt::Display for CallerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reachability of the device as reported in a status snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    Online,
}

/// Snapshot of device, SIM and temperature information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub device_info: String,
    pub sim_info: String,
    pub temperature_info: String,
    pub status: LinkStatus,
}

/// An outbound SMS: destination and UTF-8 body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsSendRequest {
    pub destination_number: String,
    pub body: String,
}

impl SmsSendRequest {
    pub fn new(destination_number: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            destination_number: destination_number.into(),
            body: body.into(),
        }
    }
}

/// Device listing wrapped for the machine-to-machine API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedMessages {
    pub messages: String,
}

/// Result of a send attempt that reached the device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_id: Option<i64>,
}

impl SendOutcome {
    /// Sent with no log record
    pub fn sent() -> Self {
        Self {
            success: true,
            message: Some(MESSAGE_SENT.into()),
            error: None,
            log_id: None,
        }
    }

    /// Sent and recorded in the message log
    pub fn sent_and_logged(log_id: i64) -> Self {
        Self {
            log_id: Some(log_id),
            ..Self::sent()
        }
    }

    /// Sent, but the log write failed afterwards
    pub fn logging_failed(reason: impl fmt::Display) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(format!("Message sent but logging failed: {}", reason)),
            log_id: None,
        }
    }
}

/// Direction of a logged message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Sent,
    Received,
}

/// Delivery status of a logged message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Pending,
    Sent,
    Failed,
    Delivered,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Received => "received",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sent" => Some(Self::Sent),
            "received" => Some(Self::Received),
            _ => None,
        }
    }
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Failed => "failed",
            Self::Delivered => "delivered",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "sent" => Some(Self::Sent),
            "failed" => Some(Self::Failed),
            "delivered" => Some(Self::Delivered),
            _ => None,
        }
    }
}

/// A log record to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLogEntry {
    pub user_id: CallerId,
    pub destination: String,
    pub body: String,
    pub direction: Direction,
    pub status: DeliveryStatus,
    pub timestamp: DateTime<Utc>,
}

impl NewLogEntry {
    /// Record of a message the device accepted for sending
    pub fn sent(user_id: CallerId, destination: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            user_id,
            destination: destination.into(),
            body: body.into(),
            direction: Direction::Sent,
            status: DeliveryStatus::Sent,
            timestamp: Utc::now(),
        }
    }
}

/// A stored log record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageLogEntry {
    pub id: i64,
    pub user_id: CallerId,
    pub destination: String,
    pub body: String,
    pub direction: Direction,
    pub status: DeliveryStatus,
    pub timestamp: DateTime<Utc>,
}

impl MessageLogEntry {
    pub fn from_new(id: i64, entry: NewLogEntry) -> Self {
        Self {
            id,
            user_id: entry.user_id,
            destination: entry.destination,
            body: entry.body,
            direction: entry.direction,
            status: entry.status,
            timestamp: entry.timestamp,
        }
    }
}
