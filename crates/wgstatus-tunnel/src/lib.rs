//! wgstatus tunnel status
//!
//! Read-only access to the host's WireGuard interfaces and their peers,
//! normalized into serializable [`Snapshot`]s.

#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod error;
pub mod privilege;
pub mod snapshot;
pub mod wireguard;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

// Re-exports
pub use client::{InterfaceHandle, PeerRecord, TunnelClient, TunnelProvider};
pub use config::{Backend, ProviderConfig};
pub use error::{SnapshotError, TunnelError, TunnelResult};
pub use privilege::ensure_privileged;
pub use snapshot::{Handshake, InterfaceInfo, PeerInfo, Snapshot, SnapshotBuilder};
pub use wireguard::WireguardProvider;
