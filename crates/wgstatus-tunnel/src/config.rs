//! Adapter configuration

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::TunnelError;

/// Where the kernel exposes the WireGuard module once it is loaded
pub const DEFAULT_MODULE_PATH: &str = "/sys/module/wireguard";

/// Directory holding the UAPI sockets of userspace implementations
pub const DEFAULT_UAPI_DIR: &str = "/var/run/wireguard";

/// WireGuard control backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// In-kernel WireGuard, queried over generic netlink (Linux only)
    Kernel,
    /// Userspace implementations (wireguard-go, boringtun) via UAPI sockets
    Userspace,
    /// Kernel when the module is loaded, userspace otherwise
    #[default]
    Auto,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Kernel => write!(f, "kernel"),
            Backend::Userspace => write!(f, "userspace"),
            Backend::Auto => write!(f, "auto"),
        }
    }
}

impl FromStr for Backend {
    type Err = TunnelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kernel" => Ok(Backend::Kernel),
            "userspace" | "user" => Ok(Backend::Userspace),
            "auto" => Ok(Backend::Auto),
            other => Err(TunnelError::Config(format!(
                "unknown backend '{}' (expected kernel, userspace or auto)",
                other
            ))),
        }
    }
}

/// Configuration for the WireGuard provider
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Requested backend
    pub backend: Backend,

    /// Presence of this path means the kernel module is loaded
    pub module_path: PathBuf,

    /// Presence of this directory means a userspace daemon may be running.
    ///
    /// Only gates detection: `wireguard-control` always opens sockets under
    /// [`DEFAULT_UAPI_DIR`], so change it only to point detection elsewhere.
    pub uapi_dir: PathBuf,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Auto,
            module_path: PathBuf::from(DEFAULT_MODULE_PATH),
            uapi_dir: PathBuf::from(DEFAULT_UAPI_DIR),
        }
    }
}

impl ProviderConfig {
    /// Create a config for the given backend with default probe paths
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            ..Default::default()
        }
    }

    /// Override the kernel module probe path
    pub fn with_module_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.module_path = path.into();
        self
    }

    /// Override the UAPI socket directory probe path
    pub fn with_uapi_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.uapi_dir = path.into();
        self
    }
}
