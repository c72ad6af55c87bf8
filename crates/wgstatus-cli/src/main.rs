//! wgstatus: WireGuard status API and dashboard

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use wgstatus_server::server::{DEFAULT_PORT, DEFAULT_QUERY_TIMEOUT};
use wgstatus_server::{
    fetch_snapshot, init_logging, start_server, LogConfig, LogFormat, ServerConfig,
};
use wgstatus_tunnel::{
    ensure_privileged, Backend, ProviderConfig, Snapshot, SnapshotBuilder, TunnelResult,
    WireguardProvider,
};

/// wgstatus: read-only status of the host's WireGuard interfaces
#[derive(Parser, Debug)]
#[command(name = "wgstatus")]
#[command(version)]
#[command(about = "Serve WireGuard peer status over HTTP", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log output format (pretty, compact)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// WireGuard backend (kernel, userspace, auto)
    #[arg(long, env = "WG_BACKEND", default_value = "auto", global = true)]
    backend: Backend,

    /// Seconds to wait for the WireGuard backend before giving up
    #[arg(
        long,
        env = "WG_QUERY_TIMEOUT",
        default_value_t = DEFAULT_QUERY_TIMEOUT.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..),
        global = true
    )]
    timeout_secs: u64,

    /// HTTP listen port
    #[arg(short, long, env = "WG_APP_PORT", default_value_t = DEFAULT_PORT, global = true)]
    port: u16,

    /// HTTP listen address
    #[arg(
        long,
        env = "WG_APP_BIND",
        default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        global = true
    )]
    bind: IpAddr,

    /// Base URL the dashboard is reachable under (display only)
    #[arg(long, env = "WG_APP_URL", default_value = "http://localhost", global = true)]
    url: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Serve the status API and dashboard (default)
    Serve,

    /// Print one status snapshot and exit
    Status {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&LogConfig::new(cli.verbose, cli.log_format));

    let provider = WireguardProvider::new(ProviderConfig::new(cli.backend));
    let builder = SnapshotBuilder::new(Arc::new(provider));
    let timeout = Duration::from_secs(cli.timeout_secs);

    match cli.command {
        Some(Commands::Status { json }) => cmd_status(builder, timeout, json, ensure_privileged),
        Some(Commands::Serve) | None => cmd_serve(&cli, builder, timeout, ensure_privileged),
    }
}

/// Refuse to run without root; no request could succeed otherwise
fn check_privilege(guard: impl Fn() -> TunnelResult<()>) -> Result<()> {
    guard().map_err(|e| {
        tracing::error!("{}, exiting", e);
        e
    })?;
    Ok(())
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")
}

/// Serve the HTTP API until Ctrl-C. `guard` runs before anything is bound.
fn cmd_serve(
    cli: &Cli,
    builder: SnapshotBuilder,
    timeout: Duration,
    guard: impl Fn() -> TunnelResult<()>,
) -> Result<()> {
    tracing::info!("Starting up");
    check_privilege(guard)?;

    let config = ServerConfig {
        listen_addr: SocketAddr::new(cli.bind, cli.port),
        query_timeout: timeout,
    };
    tracing::info!(
        backend = %cli.backend,
        "Dashboard will be available under {}:{}/dashboard",
        cli.url.trim_end_matches('/'),
        cli.port
    );

    runtime()?.block_on(async move {
        start_server(config, builder, shutdown_signal())
            .await
            .map_err(|e| anyhow::anyhow!(e))
            .context("Status server failed")
    })?;

    tracing::info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Could not listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}

/// Print a single snapshot
fn cmd_status(
    builder: SnapshotBuilder,
    timeout: Duration,
    json: bool,
    guard: impl Fn() -> TunnelResult<()>,
) -> Result<()> {
    check_privilege(guard)?;

    let snapshot = runtime()?
        .block_on(fetch_snapshot(&builder, timeout))
        .context("Failed to read WireGuard status")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print!("{}", render_table(&snapshot));
    }
    Ok(())
}

fn render_table(snapshot: &Snapshot) -> String {
    if snapshot.is_empty() {
        return "No WireGuard interfaces found.\n".to_string();
    }

    let mut out = String::new();
    for iface in snapshot.interfaces() {
        out.push_str(&format!("interface: {}\n", iface.device_name));
        if iface.peer_info.is_empty() {
            out.push_str("  (no peers)\n");
        }
        for (i, peer) in iface.peer_info.iter().enumerate() {
            let endpoint = peer
                .endpoint
                .map(|ep| ep.to_string())
                .unwrap_or_else(|| "none".to_string());
            out.push_str(&format!(
                "  peer {}: endpoint={} latest handshake={}\n",
                i + 1,
                endpoint,
                peer.last_handshake
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::time::{SystemTime, UNIX_EPOCH};
    use wgstatus_tunnel::testing::FakeProvider;
    use wgstatus_tunnel::{PeerRecord, TunnelError};

    fn deny() -> TunnelResult<()> {
        Err(TunnelError::PermissionDenied("must be run as root".into()))
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_serve_is_default() {
        let cli =
            Cli::try_parse_from(["wgstatus", "--port", "8080", "--backend", "userspace"]).unwrap();
        assert_eq!(cli.command, None);
        assert_eq!(cli.port, 8080);
        assert_eq!(cli.backend, Backend::Userspace);
    }

    #[test]
    fn test_status_subcommand() {
        let cli = Cli::try_parse_from(["wgstatus", "status", "--json"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Status { json: true }));
    }

    #[test]
    fn test_bad_backend_rejected() {
        assert!(Cli::try_parse_from(["wgstatus", "--backend", "netlink"]).is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(Cli::try_parse_from(["wgstatus", "--timeout-secs", "0"]).is_err());
        let cli = Cli::try_parse_from(["wgstatus", "--timeout-secs", "1"]).unwrap();
        assert_eq!(cli.timeout_secs, 1);
    }

    #[test]
    fn test_serve_refuses_without_privilege_before_binding() {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let port_arg = port.to_string();
        let cli = Cli::try_parse_from([
            "wgstatus",
            "--bind",
            "127.0.0.1",
            "--port",
            port_arg.as_str(),
        ])
        .unwrap();
        let builder = SnapshotBuilder::new(Arc::new(FakeProvider::new()));

        let err = cmd_serve(&cli, builder, DEFAULT_QUERY_TIMEOUT, deny).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TunnelError>(),
            Some(TunnelError::PermissionDenied(_))
        ));

        // Nothing was left listening on the configured port.
        assert!(std::net::TcpListener::bind(("127.0.0.1", port)).is_ok());
    }

    #[test]
    fn test_status_refuses_without_privilege() {
        let provider = Arc::new(FakeProvider::new());
        let builder = SnapshotBuilder::new(provider.clone());

        assert!(cmd_status(builder, DEFAULT_QUERY_TIMEOUT, true, deny).is_err());
        assert_eq!(provider.opened(), 0);
    }

    #[test]
    fn test_render_table() {
        let handshake: SystemTime = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let provider = FakeProvider::new()
            .with_interface(
                "wg0",
                vec![
                    PeerRecord::new(Some(handshake), Some("10.0.0.5:51820".parse().unwrap())),
                    PeerRecord::new(None, None),
                ],
            )
            .with_interface("wg1", vec![]);
        let snapshot = SnapshotBuilder::new(Arc::new(provider)).build().unwrap();

        assert_eq!(
            render_table(&snapshot),
            "interface: wg0\n  \
             peer 1: endpoint=10.0.0.5:51820 latest handshake=Tue, 14 Nov 2023 22:13:20 UTC\n  \
             peer 2: endpoint=none latest handshake=never\n\
             interface: wg1\n  (no peers)\n"
        );
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(
            render_table(&Snapshot::default()),
            "No WireGuard interfaces found.\n"
        );
    }
}
