//! One device session: open, run commands, close

use crate::config::SessionTimeouts;
use crate::error::{GatewayError, Result};
use crate::transport::{DeviceConnector, DeviceLink};
use sms_gateway_shared::{CommandOutput, DeviceCommand};
use std::time::Instant;
use tokio::time::timeout;
use tracing::{debug, warn};

/// A live session to the device
///
/// Created per operation and never reused. `close` consumes the session.
pub struct RemoteSession {
    link: Box<dyn DeviceLink>,
    target: String,
    timeouts: SessionTimeouts,
    interface_up: bool,
    opened_at: Instant,
}

impl RemoteSession {
    /// Connect, authenticate and bring the modem interface up
    ///
    /// Timeouts come from the connector. A failed interface activation is
    /// logged and tolerated: the session is returned with
    /// `interface_up() == false`.
    pub async fn open(connector: &dyn DeviceConnector) -> Result<Self> {
        let target = connector.target().to_string();
        let timeouts = connector.timeouts();
        debug!(device = %target, "Opening device session");

        let link = match timeout(timeouts.connect, connector.connect()).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(GatewayError::connection(
                    &target,
                    format!("connect timed out after {:?}", timeouts.connect),
                ))
            }
        };

        let mut session = Self {
            link,
            target,
            timeouts,
            interface_up: false,
            opened_at: Instant::now(),
        };
        session.activate_interface().await;
        Ok(session)
    }

    async fn activate_interface(&mut self) {
        match timeout(self.timeouts.command, self.link.bring_up_interface()).await {
            Ok(Ok(())) => self.interface_up = true,
            Ok(Err(e)) => {
                warn!(device = %self.target, "Interface activation failed, continuing: {}", e);
            }
            Err(_) => {
                warn!(
                    device = %self.target,
                    "Interface activation timed out after {:?}, continuing",
                    self.timeouts.command
                );
            }
        }
    }

    /// Whether the interface activation succeeded
    pub fn interface_up(&self) -> bool {
        self.interface_up
    }

    /// Run one device command, bounded by the command timeout
    pub async fn run_command(&mut self, command: &DeviceCommand) -> Result<CommandOutput> {
        debug!(device = %self.target, command = %command, "Running device command");

        match timeout(self.timeouts.command, self.link.execute(command)).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::command(
                command.name(),
                format!("timed out after {:?}", self.timeouts.command),
            )),
        }
    }

    /// Release the transport; failures are logged, never returned
    pub async fn close(mut self) {
        if let Err(e) = self.link.close().await {
            warn!(device = %self.target, "Failed to close device session: {}", e);
        }
        debug!(
            device = %self.target,
            elapsed_ms = self.opened_at.elapsed().as_millis() as u64,
            "Device session closed"
        );
    }
}
