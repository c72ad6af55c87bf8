//! Tunnel and snapshot error types

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result type for tunnel operations
pub type TunnelResult<T> = Result<T, TunnelError>;

/// Errors raised by a tunnel provider or client
#[derive(Debug, Error)]
pub enum TunnelError {
    /// The tunnel-control subsystem could not be opened
    #[error("WireGuard client unavailable: {0}")]
    ClientUnavailable(String),

    /// Listing interfaces failed
    #[error("Failed to list WireGuard interfaces: {0}")]
    ListFailed(#[source] io::Error),

    /// Reading the peer table of one interface failed
    #[error("Failed to read peers of {interface}: {source}")]
    PeersFailed {
        /// Interface being queried
        interface: String,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Interface name rejected by the backend
    #[error("Invalid interface name: {0}")]
    InvalidInterface(String),

    /// Permission denied
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Platform not supported
    #[error("Platform not supported: {0}")]
    PlatformNotSupported(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Why a snapshot could not be produced.
///
/// The `Display` text carries the underlying cause and is meant for logs.
/// HTTP clients only ever see [`SnapshotError::public_message`].
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// No client could be opened
    #[error("could not open WireGuard client: {0}")]
    ClientUnavailable(#[source] TunnelError),

    /// Interface or peer enumeration failed
    #[error("could not enumerate WireGuard devices: {0}")]
    EnumerationFailed(#[source] TunnelError),

    /// The subsystem did not answer in time
    #[error("WireGuard query timed out after {0:?}")]
    Timeout(Duration),

    /// The snapshot could not be encoded
    #[error("could not serialize snapshot: {0}")]
    Serialization(String),
}

impl SnapshotError {
    /// Stable machine-readable tag for the failure class
    pub fn kind(&self) -> &'static str {
        match self {
            SnapshotError::ClientUnavailable(_) => "client_unavailable",
            SnapshotError::EnumerationFailed(_) => "enumeration_failed",
            SnapshotError::Timeout(_) => "timeout",
            SnapshotError::Serialization(_) => "serialization_failed",
        }
    }

    /// Short classification safe to hand to API clients
    pub fn public_message(&self) -> &'static str {
        match self {
            SnapshotError::ClientUnavailable(_) => "could not create wireguard client",
            SnapshotError::EnumerationFailed(_) => "could not get wireguard devices",
            SnapshotError::Timeout(_) => "timed out querying wireguard devices",
            SnapshotError::Serialization(_) => "could not serialize device status",
        }
    }
}
