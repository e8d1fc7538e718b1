//! Gateway operations - one device session per call

use crate::error::{GatewayError, Result};
use crate::session::{with_session, RemoteSession};
use crate::store::MessageLogStore;
use crate::transport::DeviceConnector;
use futures::future::BoxFuture;
use futures::FutureExt;
use sms_gateway_shared::replies::MESSAGES_CLEARED;
use sms_gateway_shared::reply::{format_listing, status_from_replies};
use sms_gateway_shared::{
    CallerId, DeviceCommand, DeviceStatus, NewLogEntry, ReceivedMessages, SendOutcome,
    SmsSendRequest, StoredCount,
};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Status, listing, clearing and sending against a single device
///
/// Every call holds the device guard for its whole open -> commands -> close
/// sequence, so commands of different calls never interleave. The sequence
/// runs on its own task: dropping the caller's future does not cut it short.
#[derive(Clone)]
pub struct GatewayOperations {
    inner: Arc<Inner>,
}

struct Inner {
    connector: Arc<dyn DeviceConnector>,
    store: Arc<dyn MessageLogStore>,
    device_lock: Mutex<()>,
}

impl GatewayOperations {
    /// Session timeouts are taken from the connector
    pub fn new(connector: Arc<dyn DeviceConnector>, store: Arc<dyn MessageLogStore>) -> Self {
        Self {
            inner: Arc::new(Inner {
                connector,
                store,
                device_lock: Mutex::new(()),
            }),
        }
    }

    /// The message log this gateway writes to
    pub fn store(&self) -> &Arc<dyn MessageLogStore> {
        &self.inner.store
    }

    /// Run `task` to completion on its own task and wait for its result
    async fn detached<T, Fut>(&self, operation: &'static str, task: Fut) -> Result<T>
    where
        T: Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        tokio::spawn(task).await.map_err(|e| {
            warn!(operation, "Device task ended abnormally: {}", e);
            GatewayError::command(operation, format!("device task ended abnormally: {}", e))
        })?
    }

    /// Device, SIM and temperature snapshot
    ///
    /// All three commands run on one session. Any failure aborts the whole
    /// fetch and discards what was already read.
    pub async fn get_status(&self) -> Result<DeviceStatus> {
        info!("Fetching device status");
        let inner = Arc::clone(&self.inner);
        self.detached("status", async move {
            inner
                .in_session("status", |session| {
                    async move {
                        let [info_cmd, sim_cmd, temp_cmd] = DeviceCommand::status_sequence();
                        let info = session.run_command(&info_cmd).await?;
                        let sim = session.run_command(&sim_cmd).await?;
                        let temperature = session.run_command(&temp_cmd).await?;
                        Ok(status_from_replies(&info, &sim, &temperature))
                    }
                    .boxed()
                })
                .await
        })
        .await
    }

    /// Stored messages as device-formatted text
    ///
    /// `sms list` is only issued when the count reply is not exactly `"0"`.
    pub async fn list_messages(&self) -> Result<String> {
        info!("Listing stored messages");
        let inner = Arc::clone(&self.inner);
        self.detached("list", async move {
            inner
                .in_session("list", |session| {
                    async move {
                        let reply = session.run_command(&DeviceCommand::SmsCount).await?;
                        let count = StoredCount::parse(&reply.stdout);

                        let listing = match &count {
                            StoredCount::Empty => String::new(),
                            StoredCount::Stored(_) => {
                                session.run_command(&DeviceCommand::SmsList).await?.stdout
                            }
                        };
                        Ok(format_listing(&count, &listing))
                    }
                    .boxed()
                })
                .await
        })
        .await
    }

    /// Listing wrapped for machine-to-machine consumers
    pub async fn received_messages(&self) -> Result<ReceivedMessages> {
        let messages = self.list_messages().await?;
        Ok(ReceivedMessages { messages })
    }

    /// Delete every stored message on the device
    pub async fn clear_messages(&self) -> Result<String> {
        info!("Clearing stored messages");
        let inner = Arc::clone(&self.inner);
        self.detached("clear", async move {
            inner
                .in_session("clear", |session| {
                    async move {
                        session.run_command(&DeviceCommand::SmsClear).await?;
                        Ok(MESSAGES_CLEARED.to_string())
                    }
                    .boxed()
                })
                .await
        })
        .await
    }

    /// Send one SMS, then log it when a caller is known
    ///
    /// A device failure is returned as an error and nothing is logged. A log
    /// failure after a successful send is reported as an unsuccessful outcome;
    /// the sent message is not retried or recalled.
    pub async fn send_message(
        &self,
        request: SmsSendRequest,
        caller: Option<CallerId>,
    ) -> Result<SendOutcome> {
        info!(destination = %request.destination_number, caller = ?caller, "Sending message");
        debug!(body_len = request.body.len(), "Message body");

        let inner = Arc::clone(&self.inner);
        self.detached("send", async move { inner.send(request, caller).await })
            .await
    }
}

impl Inner {
    async fn in_session<T, F>(&self, operation: &'static str, op: F) -> Result<T>
    where
        F: for<'s> FnOnce(&'s mut RemoteSession) -> BoxFuture<'s, Result<T>> + Send,
    {
        let _guard = self.device_lock.lock().await;
        debug!(operation, "Acquired device guard");

        let result = with_session(self.connector.as_ref(), op).await;
        if let Err(e) = &result {
            warn!(operation, "Device operation failed: {}", e);
        }
        result
    }

    async fn send(&self, request: SmsSendRequest, caller: Option<CallerId>) -> Result<SendOutcome> {
        let command = DeviceCommand::send(&request.destination_number, &request.body);
        self.in_session("send", move |session| {
            async move { session.run_command(&command).await.map(|_| ()) }.boxed()
        })
        .await?;

        let Some(user_id) = caller else {
            return Ok(SendOutcome::sent());
        };

        let entry = NewLogEntry::sent(user_id, request.destination_number, request.body);
        match self.store.record(entry).await {
            Ok(log_id) => {
                debug!(log_id, "Message logged");
                Ok(SendOutcome::sent_and_logged(log_id))
            }
            Err(e) => {
                let err = GatewayError::LogPersist(format!("{:#}", e));
                warn!(caller = %user_id, "Message sent but not logged: {}", err);
                Ok(SendOutcome::logging_failed(err))
            }
        }
    }
}
