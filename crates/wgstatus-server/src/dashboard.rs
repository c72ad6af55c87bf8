//! Embedded web dashboard
//!
//! The files under `dashboard/` are compiled into the binary and served
//! below `/dashboard`. The page polls `/info` on the same origin.

use axum::{
    extract::Path,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "dashboard/"]
struct Assets;

/// `GET /dashboard` and `GET /dashboard/`
pub async fn handle_index() -> Response {
    serve_asset("index.html")
}

/// `GET /dashboard/*path`
pub async fn handle_asset(Path(path): Path<String>) -> Response {
    serve_asset(&path)
}

fn serve_asset(path: &str) -> Response {
    match Assets::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, mime.as_ref())],
                content.data,
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, "404 Not Found").into_response(),
    }
}
