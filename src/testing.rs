//! Test doubles for the device transport and the message log
//!
//! `MockConnector` hands out scripted links that record every command and
//! count connects and closes. Failures can be injected at each stage.

use crate::config::SessionTimeouts;
use crate::error::{GatewayError, Result};
use crate::store::MessageLogStore;
use crate::transport::{DeviceConnector, DeviceLink};
use async_trait::async_trait;
use sms_gateway_shared::{CallerId, CommandOutput, DeviceCommand, MessageLogEntry, NewLogEntry};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Default)]
struct MockState {
    replies: HashMap<String, String>,
    command_failures: HashMap<String, String>,
    connect_failure: Option<String>,
    fail_interface: bool,
    fail_close: bool,
    latency: Option<Duration>,
    timeouts: SessionTimeouts,
    connects: usize,
    closes: usize,
    commands: Vec<String>,
    active: usize,
    max_active: usize,
}

/// Scripted connector; clones share state
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    state: Arc<Mutex<MockState>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Reply with `stdout` to the command named `command` (e.g. `"sms count"`)
    pub fn reply(self, command: &str, stdout: &str) -> Self {
        self.state().replies.insert(command.into(), stdout.into());
        self
    }

    /// Fail the command named `command`
    pub fn fail_command(self, command: &str, reason: &str) -> Self {
        self.state()
            .command_failures
            .insert(command.into(), reason.into());
        self
    }

    pub fn fail_connect(self, reason: &str) -> Self {
        self.state().connect_failure = Some(reason.into());
        self
    }

    pub fn fail_interface(self) -> Self {
        self.state().fail_interface = true;
        self
    }

    pub fn fail_close(self) -> Self {
        self.state().fail_close = true;
        self
    }

    /// Delay connect, interface activation and every command
    pub fn with_latency(self, latency: Duration) -> Self {
        self.state().latency = Some(latency);
        self
    }

    /// Session timeouts handed to sessions opened through this connector
    pub fn with_timeouts(self, timeouts: SessionTimeouts) -> Self {
        self.state().timeouts = timeouts;
        self
    }

    pub fn connects(&self) -> usize {
        self.state().connects
    }

    pub fn closes(&self) -> usize {
        self.state().closes
    }

    /// Encoded CLI text of every command executed, in order
    pub fn commands(&self) -> Vec<String> {
        self.state().commands.clone()
    }

    /// Highest number of links that were open at the same time
    pub fn max_concurrent_links(&self) -> usize {
        self.state().max_active
    }

    async fn delay(&self) {
        let latency = self.state().latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl DeviceConnector for MockConnector {
    async fn connect(&self) -> Result<Box<dyn DeviceLink>> {
        self.state().connects += 1;
        self.delay().await;

        let mut state = self.state();
        if let Some(reason) = state.connect_failure.clone() {
            return Err(GatewayError::connection("mock-device", reason));
        }
        state.active += 1;
        state.max_active = state.max_active.max(state.active);
        drop(state);

        Ok(Box::new(MockLink {
            connector: self.clone(),
        }))
    }

    fn target(&self) -> &str {
        "mock-device"
    }

    fn timeouts(&self) -> SessionTimeouts {
        self.state().timeouts
    }
}

struct MockLink {
    connector: MockConnector,
}

#[async_trait]
impl DeviceLink for MockLink {
    async fn bring_up_interface(&mut self) -> Result<()> {
        self.connector.delay().await;
        if self.connector.state().fail_interface {
            return Err(GatewayError::command("ifconfig usb0 up", "interface not found"));
        }
        Ok(())
    }

    async fn execute(&mut self, command: &DeviceCommand) -> Result<CommandOutput> {
        self.connector.state().commands.push(command.encode());
        self.connector.delay().await;

        let state = self.connector.state();
        if let Some(reason) = state.command_failures.get(command.name()) {
            return Err(GatewayError::command(command.name(), reason));
        }
        let stdout = state.replies.get(command.name()).cloned().unwrap_or_default();
        Ok(CommandOutput::stdout(stdout))
    }

    async fn close(&mut self) -> Result<()> {
        let mut state = self.connector.state();
        state.closes += 1;
        state.active = state.active.saturating_sub(1);
        if state.fail_close {
            return Err(GatewayError::connection("mock-device", "close failed"));
        }
        Ok(())
    }
}

/// Log store whose writes always fail
#[derive(Debug, Clone, Default)]
pub struct FailingLogStore;

#[async_trait]
impl MessageLogStore for FailingLogStore {
    async fn record(&self, _entry: NewLogEntry) -> anyhow::Result<i64> {
        anyhow::bail!("database is locked")
    }

    async fn history_for(&self, _user_id: CallerId) -> anyhow::Result<Vec<MessageLogEntry>> {
        Ok(Vec::new())
    }

    async fn all(&self) -> anyhow::Result<Vec<MessageLogEntry>> {
        Ok(Vec::new())
    }
}
