//! Device connection configuration

use sms_gateway_shared::device;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors detected at startup
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Invalid setting {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Bounds on the slow parts of a device session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimeouts {
    /// Connect + authenticate
    pub connect: Duration,
    /// Each command, including interface activation
    pub command: Duration,
}

impl Default for SessionTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_millis(device::CONNECT_TIMEOUT_MS),
            command: Duration::from_millis(device::COMMAND_TIMEOUT_MS),
        }
    }
}

/// Target device and administrative credentials
#[derive(Clone)]
pub struct DeviceConfig {
    /// Device hostname or IP address
    pub host: String,
    /// SSH port
    pub port: u16,
    /// Administrative username
    pub username: String,
    /// Administrative password
    pub password: String,
    /// Session timeouts
    pub timeouts: SessionTimeouts,
}

impl DeviceConfig {
    /// Create a config for the default SSH port and timeouts
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: device::DEFAULT_SSH_PORT,
            username: username.into(),
            password: password.into(),
            timeouts: SessionTimeouts::default(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_timeouts(mut self, timeouts: SessionTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Reject configs that cannot reach the device
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Missing("device host"));
        }
        if self.username.is_empty() {
            return Err(ConfigError::Missing("device username"));
        }
        if self.password.is_empty() {
            return Err(ConfigError::Missing("device password"));
        }
        if self.port == 0 {
            return Err(ConfigError::Invalid {
                name: "device port",
                reason: "port 0 is not connectable".into(),
            });
        }
        for (name, value) in [
            ("connect timeout", self.timeouts.connect),
            ("command timeout", self.timeouts.command),
        ] {
            if value.is_zero() {
                return Err(ConfigError::Invalid {
                    name,
                    reason: "must be greater than zero".into(),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Debug for DeviceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeouts", &self.timeouts)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DeviceConfig::new("192.168.1.1", "admin", "pw");
        assert_eq!(config.port, 22);
        assert_eq!(config.timeouts.connect, Duration::from_secs(10));
        assert_eq!(config.timeouts.command, Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_values_rejected() {
        assert_eq!(
            DeviceConfig::new("", "admin", "pw").validate(),
            Err(ConfigError::Missing("device host"))
        );
        assert_eq!(
            DeviceConfig::new("host", "", "pw").validate(),
            Err(ConfigError::Missing("device username"))
        );
        assert_eq!(
            DeviceConfig::new("host", "admin", "").validate(),
            Err(ConfigError::Missing("device password"))
        );
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = DeviceConfig::new("host", "admin", "pw").with_timeouts(SessionTimeouts {
            connect: Duration::ZERO,
            command: Duration::from_secs(1),
        });
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { name: "connect timeout", .. })
        ));
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = DeviceConfig::new("host", "admin", "hunter2");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }
}
