//! Status HTTP server
//!
//! Provides an axum-based HTTP server that exposes:
//! - `GET /`: fixed JSON greeting (liveness)
//! - `GET /info`: JSON snapshot of every WireGuard interface
//! - `GET /dashboard`: embedded web dashboard

use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use wgstatus_tunnel::{Snapshot, SnapshotBuilder, SnapshotError, TunnelError};

use crate::dashboard;

/// Greeting returned by `GET /`
pub const GREETING: &str = "wireguard status api";

/// Default listen port
pub const DEFAULT_PORT: u16 = 3001;

/// Default bound on one backend query
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for the status server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address (e.g., "0.0.0.0:3001")
    pub listen_addr: SocketAddr,
    /// Upper bound for building one snapshot
    pub query_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }
}

/// State shared by all handlers. Holds no mutable data.
#[derive(Debug, Clone)]
pub struct AppState {
    builder: SnapshotBuilder,
    query_timeout: Duration,
}

impl AppState {
    /// Create handler state
    pub fn new(builder: SnapshotBuilder, query_timeout: Duration) -> Self {
        Self {
            builder,
            query_timeout,
        }
    }
}

#[derive(Debug, Serialize)]
struct Greeting {
    message: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_index))
        .route("/info", get(handle_info))
        .route("/dashboard", get(dashboard::handle_index))
        .route("/dashboard/", get(dashboard::handle_index))
        .route("/dashboard/*path", get(dashboard::handle_asset))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve on an already bound listener until `shutdown` resolves
pub async fn serve<F>(
    listener: TcpListener,
    state: AppState,
    shutdown: F,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Start the status HTTP server.
///
/// Binds `config.listen_addr` and runs until `shutdown` resolves.
pub async fn start_server<F>(
    config: ServerConfig,
    builder: SnapshotBuilder,
    shutdown: F,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(config.listen_addr).await?;
    tracing::info!("Status server listening on {}", listener.local_addr()?);

    serve(listener, AppState::new(builder, config.query_timeout), shutdown).await
}

/// Build a snapshot on the blocking pool, bounded by `timeout`.
///
/// If the deadline passes the backend call keeps running to completion in
/// the background; only its result is discarded.
pub async fn fetch_snapshot(
    builder: &SnapshotBuilder,
    timeout: Duration,
) -> Result<Snapshot, SnapshotError> {
    let builder = builder.clone();
    let task = tokio::task::spawn_blocking(move || builder.build());

    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => Err(SnapshotError::EnumerationFailed(TunnelError::Other(format!(
            "snapshot task failed: {}",
            e
        )))),
        Err(_) => Err(SnapshotError::Timeout(timeout)),
    }
}

async fn handle_index() -> Json<Greeting> {
    Json(Greeting { message: GREETING })
}

async fn handle_info(State(state): State<AppState>) -> Response {
    let body = fetch_snapshot(&state.builder, state.query_timeout)
        .await
        .and_then(|snapshot| {
            serde_json::to_vec(&snapshot).map_err(|e| SnapshotError::Serialization(e.to_string()))
        });

    match body {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}

fn error_response(err: &SnapshotError) -> Response {
    tracing::error!(kind = err.kind(), error = %err, "Status request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: err.public_message(),
        }),
    )
        .into_response()
}
