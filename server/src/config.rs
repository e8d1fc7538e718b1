//! Server configuration from command-line flags and environment

use clap::Parser;
use sms_gateway::{ConfigError, DeviceConfig, SessionTimeouts};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "sms-gateway-server", version, about = "HTTP API for a UniFi LTE SMS gateway")]
pub struct Args {
    /// Device hostname or IP address
    #[arg(long, env = "UNIFI_HOST")]
    pub host: String,

    /// Device SSH port
    #[arg(long, env = "UNIFI_PORT", default_value_t = 22)]
    pub port: u16,

    /// Administrative username
    #[arg(long, env = "UNIFI_USERNAME")]
    pub username: String,

    /// Administrative password
    #[arg(long, env = "UNIFI_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Shared secret for bearer tokens and the `auth` header
    #[arg(long, env = "SMS_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// SQLite message log
    #[arg(long, env = "DATABASE_PATH", default_value = "unifi_sms.db")]
    pub database: PathBuf,

    /// Listen address
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8585")]
    pub bind: SocketAddr,

    /// Connect and authenticate timeout
    #[arg(long, env = "CONNECT_TIMEOUT_SECS", default_value_t = 10)]
    pub connect_timeout_secs: u64,

    /// Per-command timeout
    #[arg(long, env = "COMMAND_TIMEOUT_SECS", default_value_t = 30)]
    pub command_timeout_secs: u64,
}

impl Args {
    /// Validated device settings
    pub fn device_config(&self) -> Result<DeviceConfig, ConfigError> {
        if self.api_key.is_empty() {
            return Err(ConfigError::Missing("api key"));
        }
        let timeouts = SessionTimeouts {
            connect: Duration::from_secs(self.connect_timeout_secs),
            command: Duration::from_secs(self.command_timeout_secs),
        };
        let config = DeviceConfig::new(&self.host, &self.username, &self.password)
            .with_port(self.port)
            .with_timeouts(timeouts);
        config.validate()?;
        Ok(config)
    }
}
