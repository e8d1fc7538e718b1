//! SSH transport to the device
//!
//! The management CLI is not reachable from the outer login shell. Every
//! device command travels two hops:
//! ```text
//! outer SSH session -> ssh -y root@<inner address> -> cm <command>
//! ```
//! The inner address is read on the device from `/var/run/topipv6`.
//!
//! Host keys are accepted on first sight with no pinning. The device is a
//! single appliance on a private management network; each acceptance is
//! logged at warn level so operators can see the relaxation in effect.

use crate::config::{DeviceConfig, SessionTimeouts};
use crate::error::{GatewayError, Result};
use crate::transport::traits::{DeviceConnector, DeviceLink};
use async_trait::async_trait;
use bytes::BytesMut;
use russh::client::{self, Handle};
use russh::{ChannelMsg, Disconnect};
use russh_keys::key::PublicKey;
use sms_gateway_shared::device::{INNER_ADDRESS_FILE, INTERFACE_UP_COMMAND, MANAGEMENT_CLI};
use sms_gateway_shared::{CommandOutput, DeviceCommand};
use std::sync::Arc;
use tracing::{debug, warn};

/// Wrap a CLI command in the two-hop invocation run by the outer shell
pub fn nested_invocation(cli: &str) -> String {
    format!(
        "ssh -y root@$(cat {}) '{} {}'",
        INNER_ADDRESS_FILE, MANAGEMENT_CLI, cli
    )
}

/// Client handler implementing the trust-on-first-use key policy
struct AcceptAnyHostKey {
    host: String,
}

#[async_trait]
impl client::Handler for AcceptAnyHostKey {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        warn!(
            host = %self.host,
            fingerprint = %server_public_key.fingerprint(),
            "Accepting unverified device host key"
        );
        Ok(true)
    }
}

/// SSH connector for the configured device
pub struct SshConnector {
    config: DeviceConfig,
    target: String,
}

impl SshConnector {
    pub fn new(config: DeviceConfig) -> Self {
        let target = format!("{}:{}", config.host, config.port);
        Self { config, target }
    }
}

#[async_trait]
impl DeviceConnector for SshConnector {
    async fn connect(&self) -> Result<Box<dyn DeviceLink>> {
        let ssh_config = Arc::new(client::Config::default());
        let handler = AcceptAnyHostKey {
            host: self.target.clone(),
        };

        let mut handle = client::connect(
            ssh_config,
            (self.config.host.as_str(), self.config.port),
            handler,
        )
        .await
        .map_err(|e| GatewayError::connection(&self.target, e))?;

        let authenticated = handle
            .authenticate_password(self.config.username.as_str(), self.config.password.as_str())
            .await
            .map_err(|e| GatewayError::connection(&self.target, e))?;

        if !authenticated {
            // Half-open handle: release it before reporting
            let _ = handle
                .disconnect(Disconnect::ByApplication, "authentication failed", "en")
                .await;
            return Err(GatewayError::connection(
                &self.target,
                "password authentication rejected",
            ));
        }

        debug!(device = %self.target, "SSH session authenticated");
        Ok(Box::new(SshLink {
            handle,
            target: self.target.clone(),
        }))
    }

    fn target(&self) -> &str {
        &self.target
    }

    fn timeouts(&self) -> SessionTimeouts {
        self.config.timeouts
    }
}

/// An authenticated SSH session to the device
pub struct SshLink {
    handle: Handle<AcceptAnyHostKey>,
    target: String,
}

impl SshLink {
    /// Run a command on the outer shell and collect its reply streams
    async fn exec_raw(&mut self, name: &str, command_line: &str) -> Result<CommandOutput> {
        let mut channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(|e| GatewayError::command(name, e))?;

        channel
            .exec(true, command_line)
            .await
            .map_err(|e| GatewayError::command(name, e))?;

        let mut stdout = BytesMut::new();
        let mut stderr = BytesMut::new();
        let mut exit_status = None;

        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { ref data } => stdout.extend_from_slice(data),
                // ext 1 is SSH_EXTENDED_DATA_STDERR
                ChannelMsg::ExtendedData { ref data, ext: 1 } => stderr.extend_from_slice(data),
                ChannelMsg::ExitStatus { exit_status: status } => exit_status = Some(status),
                _ => {}
            }
        }

        debug!(
            device = %self.target,
            command = name,
            stdout_len = stdout.len(),
            stderr_len = stderr.len(),
            exit_status = ?exit_status,
            "Command finished"
        );

        CommandOutput::from_raw(&stdout, &stderr, exit_status)
            .and_then(CommandOutput::into_success)
            .map_err(|e| GatewayError::from_protocol(name, e))
    }
}

#[async_trait]
impl DeviceLink for SshLink {
    async fn bring_up_interface(&mut self) -> Result<()> {
        self.exec_raw(INTERFACE_UP_COMMAND, INTERFACE_UP_COMMAND)
            .await
            .map(|_| ())
    }

    async fn execute(&mut self, command: &DeviceCommand) -> Result<CommandOutput> {
        let command_line = nested_invocation(&command.encode());
        self.exec_raw(command.name(), &command_line).await
    }

    async fn close(&mut self) -> Result<()> {
        self.handle
            .disconnect(Disconnect::ByApplication, "", "en")
            .await
            .map_err(|e| GatewayError::connection(&self.target, e))
    }
}
