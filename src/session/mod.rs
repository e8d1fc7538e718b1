//! Device session lifecycle
//!
//! This module handles:
//! - Opening a session (connect, authenticate, interface activation)
//! - Bounded command execution
//! - Scoped use with guaranteed release on every path

mod remote;

pub use remote::RemoteSession;

use crate::error::Result;
use crate::transport::DeviceConnector;
use futures::future::BoxFuture;

/// Open a session, run `op` against it, and close it whatever `op` returned
pub async fn with_session<T, F>(
    connector: &dyn DeviceConnector,
    op: F,
) -> Result<T>
where
    F: for<'s> FnOnce(&'s mut RemoteSession) -> BoxFuture<'s, Result<T>>,
{
    let mut session = RemoteSession::open(connector).await?;
    let result = op(&mut session).await;
    session.close().await;
    result
}
