//! Transport trait abstraction for the device management channel

use crate::config::SessionTimeouts;
use crate::error::Result;
use async_trait::async_trait;
use sms_gateway_shared::{CommandOutput, DeviceCommand};

/// An open, authenticated link to the device
///
/// `execute` is the only way a device command reaches the hardware. How the
/// command travels (hops, wrapping, escalation) is the link's business.
#[async_trait]
pub trait DeviceLink: Send {
    /// Bring the cellular modem's network interface up
    async fn bring_up_interface(&mut self) -> Result<()>;

    /// Execute one management CLI command on the device
    async fn execute(&mut self, command: &DeviceCommand) -> Result<CommandOutput>;

    /// Release the transport
    async fn close(&mut self) -> Result<()>;
}

/// Factory for device links
#[async_trait]
pub trait DeviceConnector: Send + Sync {
    /// Connect and authenticate, returning a usable link on success
    async fn connect(&self) -> Result<Box<dyn DeviceLink>>;

    /// Human-readable target for logs and error messages
    fn target(&self) -> &str;

    /// Bounds applied to sessions opened through this connector
    fn timeouts(&self) -> SessionTimeouts;
}
