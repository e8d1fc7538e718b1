//! Device transports
//!
//! - `traits`: the link/connector seam the session layer is written against
//! - `ssh`: SSH transport with the two-hop path to the management CLI

pub mod ssh;
pub mod traits;

pub use ssh::{nested_invocation, SshConnector, SshLink};
pub use traits::{DeviceConnector, DeviceLink};
