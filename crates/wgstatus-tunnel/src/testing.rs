//! In-memory provider for tests
//!
//! Enabled inside this crate's tests and, for other crates, through the
//! `test-util` feature.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::client::{InterfaceHandle, PeerRecord, TunnelClient, TunnelProvider};
use crate::config::Backend;
use crate::error::{TunnelError, TunnelResult};

/// Provider serving a fixed interface table with injectable failures
#[derive(Debug, Clone, Default)]
pub struct FakeProvider {
    interfaces: Vec<(String, Vec<PeerRecord>)>,
    fail_open: bool,
    fail_list: bool,
    fail_peers: Option<String>,
    delay: Option<Duration>,
    opened: Arc<AtomicUsize>,
}

impl FakeProvider {
    /// Empty host: no interfaces
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an interface with its peers
    pub fn with_interface(mut self, name: &str, peers: Vec<PeerRecord>) -> Self {
        self.interfaces.push((name.to_string(), peers));
        self
    }

    /// Make `open_client` fail
    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// Make `list_interfaces` fail
    pub fn failing_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    /// Make `fetch_peers` fail for one interface
    pub fn failing_peers(mut self, name: &str) -> Self {
        self.fail_peers = Some(name.to_string());
        self
    }

    /// Sleep this long inside `list_interfaces`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// How many clients have been opened
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

impl TunnelProvider for FakeProvider {
    fn open_client(&self) -> TunnelResult<Box<dyn TunnelClient>> {
        if self.fail_open {
            return Err(TunnelError::PermissionDenied("simulated".into()));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeClient {
            provider: self.clone(),
        }))
    }
}

struct FakeClient {
    provider: FakeProvider,
}

impl TunnelClient for FakeClient {
    fn list_interfaces(&self) -> TunnelResult<Vec<InterfaceHandle>> {
        if let Some(delay) = self.provider.delay {
            std::thread::sleep(delay);
        }
        if self.provider.fail_list {
            return Err(TunnelError::ListFailed(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "simulated",
            )));
        }
        Ok(self
            .provider
            .interfaces
            .iter()
            .map(|(name, _)| InterfaceHandle::new(name.clone(), Backend::Userspace))
            .collect())
    }

    fn fetch_peers(&self, handle: &InterfaceHandle) -> TunnelResult<Vec<PeerRecord>> {
        if self.provider.fail_peers.as_deref() == Some(handle.name.as_str()) {
            return Err(TunnelError::PeersFailed {
                interface: handle.name.clone(),
                source: io::Error::new(io::ErrorKind::Other, "simulated"),
            });
        }
        self.provider
            .interfaces
            .iter()
            .find(|(name, _)| *name == handle.name)
            .map(|(_, peers)| peers.clone())
            .ok_or_else(|| TunnelError::InvalidInterface(handle.name.clone()))
    }
}
