//! Device CLI command vocabulary
//!
//! Commands are plain text with positional arguments:
//! ```text
//! info all | sim info | temp all | sms count | sms list | sms clear
//! sms send <number> "<body>"
//! ```
//!
//! The send body is wrapped in double quotes verbatim. Quotes and newlines
//! inside the body are passed through unescaped.

use std::fmt;

/// One line of the device's management CLI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCommand {
    InfoAll,
    SimInfo,
    TempAll,
    SmsCount,
    SmsList,
    SmsClear,
    SmsSend { number: String, body: String },
}

impl DeviceCommand {
    /// Build a send command for the given destination and body
    pub fn send(number: impl Into<String>, body: impl Into<String>) -> Self {
        Self::SmsSend {
            number: number.into(),
            body: body.into(),
        }
    }

    /// The three commands of the composite status fetch, in execution order
    pub fn status_sequence() -> [DeviceCommand; 3] {
        [Self::InfoAll, Self::SimInfo, Self::TempAll]
    }

    /// Short name for logging (never includes the message body)
    pub fn name(&self) -> &'static str {
        match self {
            Self::InfoAll => "info all",
            Self::SimInfo => "sim info",
            Self::TempAll => "temp all",
            Self::SmsCount => "sms count",
            Self::SmsList => "sms list",
            Self::SmsClear => "sms clear",
            Self::SmsSend { .. } => "sms send",
        }
    }

    /// Encode as the exact CLI text sent to the device
    pub fn encode(&self) -> String {
        match self {
            Self::SmsSend { number, body } => format!("sms send {} \"{}\"", number, body),
            other => other.name().to_string(),
        }
    }
}

impl fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_commands() {
        assert_eq!(DeviceCommand::InfoAll.encode(), "info all");
        assert_eq!(DeviceCommand::SimInfo.encode(), "sim info");
        assert_eq!(DeviceCommand::TempAll.encode(), "temp all");
        assert_eq!(DeviceCommand::SmsCount.encode(), "sms count");
        assert_eq!(DeviceCommand::SmsList.encode(), "sms list");
        assert_eq!(DeviceCommand::SmsClear.encode(), "sms clear");
    }

    #[test]
    fn test_send_quotes_body() {
        let cmd = DeviceCommand::send("+15551234567", "hello world");
        assert_eq!(cmd.encode(), "sms send +15551234567 \"hello world\"");
    }

    #[test]
    fn test_send_does_not_escape_body() {
        let cmd = DeviceCommand::send("123", "say \"hi\"\nbye");
        assert_eq!(cmd.encode(), "sms send 123 \"say \"hi\"\nbye\"");
    }

    #[test]
    fn test_display_hides_body() {
        let cmd = DeviceCommand::send("123", "secret text");
        assert_eq!(cmd.to_string(), "sms send");
    }

    #[test]
    fn test_status_sequence_order() {
        let names: Vec<_> = DeviceCommand::status_sequence()
            .iter()
            .map(|c| c.encode())
            .collect();
        assert_eq!(names, vec!["info all", "sim info", "temp all"]);
    }
}
