//! Gateway operations exposed to the HTTP layer
//!
//! Each operation opens its own device session, runs one or more protocol
//! commands, and closes the session before returning. Only `send_message`
//! touches the message log, and only after the device accepted the message.

mod operations;

pub use operations::GatewayOperations;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatewayError;
    use crate::store::{MemoryLogStore, MessageLogStore};
    use crate::testing::{FailingLogStore, MockConnector};
    use sms_gateway_shared::{CallerId, LinkStatus, SmsSendRequest};
    use std::sync::Arc;
    use std::time::Duration;

    fn gateway(mock: &MockConnector) -> (GatewayOperations, Arc<MemoryLogStore>) {
        let store = Arc::new(MemoryLogStore::new());
        let ops = GatewayOperations::new(Arc::new(mock.clone()), store.clone());
        (ops, store)
    }

    #[tokio::test]
    async fn test_status_composes_three_commands() {
        let mock = MockConnector::new()
            .reply("info all", "  Model: U-LTE\n")
            .reply("sim info", "ICCID: 8901\n")
            .reply("temp all", "\nPA: 35C\n");
        let (ops, _) = gateway(&mock);

        let status = ops.get_status().await.expect("status");
        assert_eq!(status.device_info, "Model: U-LTE");
        assert_eq!(status.sim_info, "ICCID: 8901");
        assert_eq!(status.temperature_info, "PA: 35C");
        assert_eq!(status.status, LinkStatus::Online);
        assert_eq!(mock.commands(), vec!["info all", "sim info", "temp all"]);
        assert_eq!((mock.connects(), mock.closes()), (1, 1));
    }

    #[tokio::test]
    async fn test_status_second_command_failure_aborts() {
        let mock = MockConnector::new()
            .reply("info all", "Model: U-LTE")
            .fail_command("sim info", "sim not inserted");
        let (ops, _) = gateway(&mock);

        let err = ops.get_status().await.expect_err("status should fail");
        assert!(matches!(err, GatewayError::Command { ref command, .. } if command == "sim info"));
        assert_eq!(mock.commands(), vec!["info all", "sim info"]);
        assert_eq!((mock.connects(), mock.closes()), (1, 1));
    }

    #[tokio::test]
    async fn test_list_zero_count_skips_listing() {
        for reply in ["0", "0\n", "\n0\n"] {
            let mock = MockConnector::new().reply("sms count", reply);
            let (ops, _) = gateway(&mock);

            assert_eq!(ops.list_messages().await.unwrap(), "NO STORED MESSAGES");
            assert_eq!(mock.commands(), vec!["sms count"]);
        }
    }

    #[tokio::test]
    async fn test_list_nonzero_count_includes_listing() {
        let mock = MockConnector::new()
            .reply("sms count", "2\n")
            .reply("sms list", "[1] +1555: hi\n[2] +1666: yo\n");
        let (ops, _) = gateway(&mock);

        assert_eq!(
            ops.list_messages().await.unwrap(),
            "2 STORED MESSAGES:\n[1] +1555: hi\n[2] +1666: yo\n"
        );
        assert_eq!(mock.commands(), vec!["sms count", "sms list"]);
    }

    #[tokio::test]
    async fn test_list_garbage_count_is_nonzero() {
        let mock = MockConnector::new()
            .reply("sms count", "modem busy\n")
            .reply("sms list", "");
        let (ops, _) = gateway(&mock);

        assert_eq!(
            ops.list_messages().await.unwrap(),
            "modem busy STORED MESSAGES:\n"
        );
        assert_eq!(mock.commands(), vec!["sms count", "sms list"]);
    }

    #[tokio::test]
    async fn test_received_wraps_listing() {
        let mock = MockConnector::new().reply("sms count", "0");
        let (ops, _) = gateway(&mock);

        let received = ops.received_messages().await.unwrap();
        assert_eq!(received.messages, "NO STORED MESSAGES");
    }

    #[tokio::test]
    async fn test_clear_confirms() {
        let mock = MockConnector::new();
        let (ops, _) = gateway(&mock);

        assert_eq!(ops.clear_messages().await.unwrap(), "ALL STORED MESSAGES CLEARED");
        assert_eq!(mock.commands(), vec!["sms clear"]);
    }

    #[tokio::test]
    async fn test_send_with_caller_logs_entry() {
        let mock = MockConnector::new();
        let (ops, store) = gateway(&mock);

        let outcome = ops
            .send_message(SmsSendRequest::new("+15551234", "hello"), Some(CallerId(4)))
            .await
            .unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.message.as_deref(), Some("MESSAGE SENT"));
        assert_eq!(outcome.log_id, Some(1));
        assert_eq!(mock.commands(), vec!["sms send +15551234 \"hello\""]);

        let history = store.history_for(CallerId(4)).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].destination, "+15551234");
        assert_eq!(history[0].body, "hello");
    }

    #[tokio::test]
    async fn test_send_device_failure_writes_no_log() {
        let mock = MockConnector::new().fail_command("sms send", "no network");
        let (ops, store) = gateway(&mock);

        let err = ops
            .send_message(SmsSendRequest::new("+15551234", "hello"), Some(CallerId(4)))
            .await
            .expect_err("send should fail");
        assert!(matches!(err, GatewayError::Command { .. }));
        assert!(store.is_empty().await);
        assert_eq!((mock.connects(), mock.closes()), (1, 1));
    }

    #[tokio::test]
    async fn test_send_log_failure_is_partial_success() {
        let mock = MockConnector::new();
        let ops = GatewayOperations::new(Arc::new(mock.clone()), Arc::new(FailingLogStore));

        let outcome = ops
            .send_message(SmsSendRequest::new("+15551234", "hello"), Some(CallerId(4)))
            .await
            .expect("device send succeeded");
        assert!(!outcome.success);
        let error = outcome.error.expect("error message");
        assert!(error.contains("sent but logging failed"), "{}", error);
        assert!(error.contains("database is locked"), "{}", error);
        // Sent exactly once, never recalled
        assert_eq!(mock.commands(), vec!["sms send +15551234 \"hello\""]);
    }

    #[tokio::test]
    async fn test_send_without_caller_skips_log() {
        let mock = MockConnector::new();
        let (ops, store) = gateway(&mock);

        let outcome = ops.send_message(SmsSendRequest::new("123", "hi"), None).await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.log_id, None);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_every_operation_closes_its_session() {
        // Failure injected at interface activation: tolerated, session still closed
        let mock = MockConnector::new().fail_interface().reply("sms count", "0");
        let (ops, _) = gateway(&mock);
        ops.get_status().await.unwrap();
        ops.list_messages().await.unwrap();
        ops.clear_messages().await.unwrap();
        ops.send_message(SmsSendRequest::new("1", "x"), None).await.unwrap();
        assert_eq!((mock.connects(), mock.closes()), (4, 4));

        // Failure injected at each command stage
        for command in ["info all", "temp all", "sms count", "sms clear", "sms send"] {
            let mock = MockConnector::new()
                .reply("sms count", "1")
                .fail_command(command, "induced");
            let (ops, _) = gateway(&mock);
            let _ = ops.get_status().await;
            let _ = ops.list_messages().await;
            let _ = ops.clear_messages().await;
            let _ = ops.send_message(SmsSendRequest::new("1", "x"), Some(CallerId(1))).await;
            assert_eq!((mock.connects(), mock.closes()), (4, 4), "stage {}", command);
        }
    }

    #[tokio::test]
    async fn test_connect_failure_surfaces_connection_error() {
        let mock = MockConnector::new().fail_connect("auth rejected");
        let (ops, store) = gateway(&mock);

        let err = ops.send_message(SmsSendRequest::new("1", "x"), Some(CallerId(1))).await.unwrap_err();
        assert!(matches!(err, GatewayError::Connection { .. }));
        assert!(store.is_empty().await);
        assert_eq!(mock.closes(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_operations_are_serialized() {
        let mock = MockConnector::new()
            .reply("sms count", "0")
            .with_latency(Duration::from_millis(20));
        let (ops, _) = gateway(&mock);
        let ops = Arc::new(ops);

        let mut handles = Vec::new();
        for i in 0..4 {
            let ops = ops.clone();
            handles.push(tokio::spawn(async move {
                if i % 2 == 0 {
                    ops.list_messages().await.map(|_| ())
                } else {
                    ops.clear_messages().await.map(|_| ())
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(mock.connects(), 4);
        assert_eq!(mock.max_concurrent_links(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_caller_still_closes_and_logs() {
        let mock = MockConnector::new().with_latency(Duration::from_secs(1));
        let (ops, store) = gateway(&mock);

        let caller = {
            let ops = ops.clone();
            tokio::spawn(async move {
                ops.send_message(SmsSendRequest::new("1", "x"), Some(CallerId(1)))
                    .await
            })
        };
        // Connect and interface activation take 2s, so the send is in flight
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(mock.commands(), vec!["sms send 1 \"x\""]);
        caller.abort();
        assert!(caller.await.unwrap_err().is_cancelled());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!((mock.connects(), mock.closes()), (1, 1));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_status_caller_finishes_sequence() {
        let mock = MockConnector::new()
            .reply("sms count", "0")
            .with_latency(Duration::from_secs(1));
        let (ops, _) = gateway(&mock);

        let caller = {
            let ops = ops.clone();
            tokio::spawn(async move { ops.get_status().await })
        };
        tokio::time::sleep(Duration::from_millis(2500)).await;
        caller.abort();
        let _ = caller.await;

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(mock.commands(), vec!["info all", "sim info", "temp all"]);
        assert_eq!((mock.connects(), mock.closes()), (1, 1));

        // Guard was released
        assert_eq!(ops.list_messages().await.unwrap(), "NO STORED MESSAGES");
        assert_eq!(mock.closes(), 2);
    }
}
