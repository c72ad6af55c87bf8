//! Point-in-time status snapshots
//!
//! A [`Snapshot`] is built fresh for every request and never mutated.
//! Interfaces and peers keep the order the backend enumerated them in.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Instant, SystemTime};

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::client::{PeerRecord, TunnelProvider};
use crate::error::{SnapshotError, TunnelError};

/// Marker rendered for peers that never completed a handshake
pub const NEVER: &str = "never";

/// RFC 1123 layout, always in UTC
pub const HANDSHAKE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S UTC";

/// Last handshake of a peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handshake {
    /// No handshake has completed yet
    Never,
    /// Handshake completed at this instant
    At(DateTime<Utc>),
}

impl Handshake {
    /// Normalize a raw backend timestamp. `None` and the epoch both mean never.
    pub fn from_system_time(time: Option<SystemTime>) -> Self {
        match PeerRecord::new(time, None).handshake() {
            Some(t) => Handshake::At(DateTime::<Utc>::from(t)),
            None => Handshake::Never,
        }
    }

    /// Whether the peer never completed a handshake
    pub fn is_never(&self) -> bool {
        matches!(self, Handshake::Never)
    }
}

impl fmt::Display for Handshake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handshake::Never => f.write_str(NEVER),
            Handshake::At(t) => write!(f, "{}", t.format(HANDSHAKE_FORMAT)),
        }
    }
}

impl Serialize for Handshake {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Status of one peer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PeerInfo {
    /// Last handshake
    pub last_handshake: Handshake,
    /// Endpoint, `null` when the peer has none
    pub endpoint: Option<SocketAddr>,
}

impl From<&PeerRecord> for PeerInfo {
    fn from(record: &PeerRecord) -> Self {
        Self {
            last_handshake: Handshake::from_system_time(record.last_handshake),
            endpoint: record.endpoint,
        }
    }
}

/// Status of one interface and its peers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InterfaceInfo {
    /// Interface name, never empty
    pub device_name: String,
    /// Peers in backend order
    pub peer_info: Vec<PeerInfo>,
}

/// All interfaces on the host at one point in time.
///
/// Serializes as a bare JSON array of interfaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(transparent)]
pub struct Snapshot {
    interfaces: Vec<InterfaceInfo>,
}

impl Snapshot {
    /// Interfaces in enumeration order
    pub fn interfaces(&self) -> &[InterfaceInfo] {
        &self.interfaces
    }

    /// Number of interfaces
    pub fn len(&self) -> usize {
        self.interfaces.len()
    }

    /// Whether the host has no interfaces
    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }

    /// Total number of peers across all interfaces
    pub fn peer_count(&self) -> usize {
        self.interfaces.iter().map(|i| i.peer_info.len()).sum()
    }
}

/// Builds snapshots through an injected provider
#[derive(Clone)]
pub struct SnapshotBuilder {
    provider: Arc<dyn TunnelProvider>,
}

impl SnapshotBuilder {
    /// Create a builder over the given provider
    pub fn new(provider: Arc<dyn TunnelProvider>) -> Self {
        Self { provider }
    }

    /// Build a consistent snapshot or fail as a whole.
    ///
    /// Blocks on the backend; call from a blocking context.
    pub fn build(&self) -> Result<Snapshot, SnapshotError> {
        let started = Instant::now();

        let client = self.provider.open_client().map_err(|e| {
            tracing::warn!(error = %e, "Could not open WireGuard client");
            SnapshotError::ClientUnavailable(e)
        })?;

        let handles = client.list_interfaces().map_err(|e| {
            tracing::warn!(error = %e, "Could not list WireGuard interfaces");
            SnapshotError::EnumerationFailed(e)
        })?;

        let mut interfaces = Vec::with_capacity(handles.len());
        for handle in &handles {
            if handle.name.is_empty() {
                tracing::warn!("Backend reported an interface without a name");
                return Err(SnapshotError::EnumerationFailed(TunnelError::InvalidInterface(
                    String::new(),
                )));
            }

            let peers = client.fetch_peers(handle).map_err(|e| {
                tracing::warn!(interface = %handle.name, error = %e, "Could not read peers");
                SnapshotError::EnumerationFailed(e)
            })?;

            interfaces.push(InterfaceInfo {
                device_name: handle.name.clone(),
                peer_info: peers.iter().map(PeerInfo::from).collect(),
            });
        }

        let snapshot = Snapshot { interfaces };
        tracing::debug!(
            interfaces = snapshot.len(),
            peers = snapshot.peer_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Built status snapshot"
        );
        Ok(snapshot)
    }
}

impl fmt::Debug for SnapshotBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotBuilder").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeProvider;
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::{Duration, UNIX_EPOCH};

    fn endpoint() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5)), 51820)
    }

    fn handshake_at(secs: u64) -> Option<SystemTime> {
        Some(UNIX_EPOCH + Duration::from_secs(secs))
    }

    fn builder(provider: FakeProvider) -> SnapshotBuilder {
        SnapshotBuilder::new(Arc::new(provider))
    }

    #[test]
    fn test_handshake_format() {
        // 2023-11-14T22:13:20Z
        let hs = Handshake::from_system_time(handshake_at(1_700_000_000));
        assert_eq!(hs.to_string(), "Tue, 14 Nov 2023 22:13:20 UTC");
    }

    #[test]
    fn test_never_handshake() {
        assert!(Handshake::from_system_time(None).is_never());
        assert!(Handshake::from_system_time(Some(UNIX_EPOCH)).is_never());
        assert_eq!(Handshake::Never.to_string(), NEVER);
    }

    #[test]
    fn test_wg0_two_peers() {
        let provider = FakeProvider::new().with_interface(
            "wg0",
            vec![
                PeerRecord::new(handshake_at(1_700_000_000), Some(endpoint())),
                PeerRecord::new(Some(UNIX_EPOCH), None),
            ],
        );

        let snapshot = builder(provider).build().unwrap();
        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(
            json,
            r#"[{"DeviceName":"wg0","PeerInfo":[{"LastHandshake":"Tue, 14 Nov 2023 22:13:20 UTC","Endpoint":"10.0.0.5:51820"},{"LastHandshake":"never","Endpoint":null}]}]"#
        );
    }

    #[test]
    fn test_no_interfaces() {
        let snapshot = builder(FakeProvider::new()).build().unwrap();
        assert!(snapshot.is_empty());
        assert_eq!(serde_json::to_string(&snapshot).unwrap(), "[]");
    }

    #[test]
    fn test_enumeration_order_preserved() {
        let provider = FakeProvider::new()
            .with_interface("wg2", vec![])
            .with_interface("wg0", vec![PeerRecord::default()])
            .with_interface("wg1", vec![PeerRecord::default(), PeerRecord::default()]);

        let snapshot = builder(provider).build().unwrap();
        let names: Vec<_> = snapshot
            .interfaces()
            .iter()
            .map(|i| i.device_name.as_str())
            .collect();
        assert_eq!(names, ["wg2", "wg0", "wg1"]);
        assert_eq!(snapshot.peer_count(), 3);
        assert!(snapshot.interfaces()[0].peer_info.is_empty());
    }

    #[test]
    fn test_open_failure() {
        let err = builder(FakeProvider::new().failing_open()).build().unwrap_err();
        assert!(matches!(err, SnapshotError::ClientUnavailable(_)));
        assert_eq!(err.public_message(), "could not create wireguard client");
    }

    #[test]
    fn test_list_failure() {
        let provider = FakeProvider::new()
            .with_interface("wg0", vec![])
            .failing_list();
        let err = builder(provider).build().unwrap_err();
        assert!(matches!(err, SnapshotError::EnumerationFailed(_)));
    }

    #[test]
    fn test_single_interface_failure_fails_all() {
        let provider = FakeProvider::new()
            .with_interface("wg0", vec![PeerRecord::default()])
            .with_interface("wg1", vec![])
            .failing_peers("wg1");
        let err = builder(provider).build().unwrap_err();
        match err {
            SnapshotError::EnumerationFailed(TunnelError::PeersFailed { interface, .. }) => {
                assert_eq!(interface, "wg1")
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_unnamed_interface_rejected() {
        let provider = FakeProvider::new().with_interface("", vec![]);
        let err = builder(provider).build().unwrap_err();
        assert!(matches!(err, SnapshotError::EnumerationFailed(_)));
    }

    #[test]
    fn test_each_build_opens_a_client() {
        let provider = Arc::new(FakeProvider::new().with_interface("wg0", vec![]));
        let builder = SnapshotBuilder::new(provider.clone());

        let first = builder.build().unwrap();
        let second = builder.build().unwrap();
        assert_eq!(first, second);
        assert_eq!(provider.opened(), 2);
    }
}
