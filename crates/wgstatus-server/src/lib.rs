//! wgstatus HTTP layer
//!
//! This crate provides:
//! - The status API (`/`, `/info`) over axum
//! - The embedded web dashboard (`/dashboard`)
//! - Structured logging setup with tracing

#![warn(missing_docs)]

pub mod dashboard;
pub mod logging;
pub mod server;

// Re-exports
pub use logging::{init_logging, LogConfig, LogFormat};
pub use server::{fetch_snapshot, router, serve, start_server, AppState, ServerConfig};
