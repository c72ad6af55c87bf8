//! WireGuard provider backed by `wireguard-control`
//!
//! Kernel interfaces are read over generic netlink, userspace ones
//! (wireguard-go, boringtun) over their UAPI sockets. In `auto` mode every
//! available backend is listed, kernel first, and each interface remembers
//! the backend that reported it. Nothing here writes to the device.

use std::io;
use std::path::PathBuf;

use wireguard_control::{Device, InterfaceName};

use crate::client::{InterfaceHandle, PeerRecord, TunnelClient, TunnelProvider};
use crate::config::{Backend, ProviderConfig};
use crate::error::{TunnelError, TunnelResult};

/// Provider for the host's WireGuard interfaces
#[derive(Debug, Clone, Default)]
pub struct WireguardProvider {
    config: ProviderConfig,
}

impl WireguardProvider {
    /// Create a new provider
    pub fn new(config: ProviderConfig) -> Self {
        Self { config }
    }

    /// Concrete backends the next client will list, in listing order.
    /// Never contains `Auto`.
    pub fn available_backends(&self) -> TunnelResult<Vec<Backend>> {
        match self.config.backend {
            Backend::Kernel if cfg!(target_os = "linux") => Ok(vec![Backend::Kernel]),
            Backend::Kernel => Err(TunnelError::PlatformNotSupported(
                "the kernel backend is only available on Linux".into(),
            )),
            Backend::Userspace => Ok(vec![Backend::Userspace]),
            Backend::Auto => {
                let mut backends = Vec::with_capacity(2);
                if cfg!(target_os = "linux") && self.config.module_path.exists() {
                    backends.push(Backend::Kernel);
                }
                if self.config.uapi_dir.is_dir() {
                    backends.push(Backend::Userspace);
                }
                if backends.is_empty() {
                    return Err(TunnelError::ClientUnavailable(format!(
                        "no WireGuard backend found (checked {} and {})",
                        self.config.module_path.display(),
                        self.config.uapi_dir.display()
                    )));
                }
                Ok(backends)
            }
        }
    }
}

impl TunnelProvider for WireguardProvider {
    fn open_client(&self) -> TunnelResult<Box<dyn TunnelClient>> {
        let backends = self.available_backends().map_err(|e| match e {
            TunnelError::ClientUnavailable(_) => e,
            other => TunnelError::ClientUnavailable(other.to_string()),
        })?;
        tracing::trace!(?backends, "Opened WireGuard client");

        let source = ControlSource {
            uapi_dir: self.config.uapi_dir.clone(),
        };
        Ok(Box::new(WireguardClient::new(backends, source)))
    }
}

/// Per-backend device access, split out so listing and dispatch can be
/// exercised without a live WireGuard subsystem.
trait DeviceSource: Send {
    fn list(&self, backend: Backend) -> TunnelResult<Vec<String>>;

    fn peers(&self, name: &str, backend: Backend) -> TunnelResult<Vec<PeerRecord>>;
}

/// `wireguard-control` calls
struct ControlSource {
    uapi_dir: PathBuf,
}

fn control_backend(backend: Backend) -> TunnelResult<wireguard_control::Backend> {
    match backend {
        #[cfg(target_os = "linux")]
        Backend::Kernel => Ok(wireguard_control::Backend::Kernel),
        Backend::Userspace => Ok(wireguard_control::Backend::Userspace),
        other => Err(TunnelError::PlatformNotSupported(format!(
            "{} backend cannot be queried directly",
            other
        ))),
    }
}

impl DeviceSource for ControlSource {
    fn list(&self, backend: Backend) -> TunnelResult<Vec<String>> {
        // No socket directory means no userspace daemon is running.
        if backend == Backend::Userspace && !self.uapi_dir.is_dir() {
            return Ok(Vec::new());
        }

        let names = match Device::list(control_backend(backend)?) {
            Ok(names) => names,
            Err(e) if backend == Backend::Userspace && e.kind() == io::ErrorKind::NotFound => {
                Vec::new()
            }
            Err(e) => {
                if e.kind() == io::ErrorKind::PermissionDenied {
                    tracing::warn!("Listing WireGuard interfaces needs root or CAP_NET_ADMIN");
                }
                return Err(TunnelError::ListFailed(e));
            }
        };

        Ok(names.iter().map(|name| name.to_string()).collect())
    }

    fn peers(&self, name: &str, backend: Backend) -> TunnelResult<Vec<PeerRecord>> {
        let iface: InterfaceName = name
            .parse()
            .map_err(|_| TunnelError::InvalidInterface(name.to_string()))?;

        let device = Device::get(&iface, control_backend(backend)?).map_err(|source| {
            TunnelError::PeersFailed {
                interface: name.to_string(),
                source,
            }
        })?;

        Ok(device
            .peers
            .into_iter()
            .map(|peer| PeerRecord::new(peer.stats.last_handshake_time, peer.config.endpoint))
            .collect())
    }
}

/// Client over one or more resolved backends
struct WireguardClient<S> {
    backends: Vec<Backend>,
    source: S,
}

impl<S: DeviceSource> WireguardClient<S> {
    fn new(backends: Vec<Backend>, source: S) -> Self {
        Self { backends, source }
    }
}

impl<S: DeviceSource> TunnelClient for WireguardClient<S> {
    fn list_interfaces(&self) -> TunnelResult<Vec<InterfaceHandle>> {
        let mut handles = Vec::new();
        for &backend in &self.backends {
            let names = self.source.list(backend)?;
            handles.extend(names.into_iter().map(|name| InterfaceHandle::new(name, backend)));
        }
        Ok(handles)
    }

    fn fetch_peers(&self, handle: &InterfaceHandle) -> TunnelResult<Vec<PeerRecord>> {
        self.source.peers(&handle.name, handle.backend)
    }
}
