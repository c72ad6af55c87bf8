//! Tunnel client abstraction
//!
//! A [`TunnelProvider`] opens short-lived [`TunnelClient`]s. Each snapshot
//! opens its own client, so concurrent requests never share a handle.

use std::net::SocketAddr;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::Backend;
use crate::error::TunnelResult;

/// An interface as enumerated by a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceHandle {
    /// Interface name (e.g. "wg0")
    pub name: String,
    /// Backend that reported the interface; peers are fetched through it
    pub backend: Backend,
}

impl InterfaceHandle {
    /// Create a new handle
    pub fn new(name: impl Into<String>, backend: Backend) -> Self {
        Self {
            name: name.into(),
            backend,
        }
    }
}

/// Raw peer data as reported by the backend
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PeerRecord {
    /// Last handshake; `None` or the UNIX epoch means no handshake yet
    pub last_handshake: Option<SystemTime>,
    /// Current endpoint, if one is known
    pub endpoint: Option<SocketAddr>,
}

impl PeerRecord {
    /// Create a peer record
    pub fn new(last_handshake: Option<SystemTime>, endpoint: Option<SocketAddr>) -> Self {
        Self {
            last_handshake,
            endpoint,
        }
    }

    /// The real handshake instant, or `None` if the peer never completed one
    pub fn handshake(&self) -> Option<SystemTime> {
        self.last_handshake.filter(|t| *t > UNIX_EPOCH)
    }
}

/// An open handle to the tunnel-control subsystem. Read-only.
pub trait TunnelClient: Send {
    /// List interfaces in backend enumeration order
    fn list_interfaces(&self) -> TunnelResult<Vec<InterfaceHandle>>;

    /// Read the peer table of one interface, in backend order
    fn fetch_peers(&self, handle: &InterfaceHandle) -> TunnelResult<Vec<PeerRecord>>;
}

/// Opens clients. Implementations hold configuration only.
pub trait TunnelProvider: Send + Sync {
    /// Open a fresh client
    fn open_client(&self) -> TunnelResult<Box<dyn TunnelClient>>;
}
