//! Static throttle UI served from a directory on disk.
//!
//! Unknown paths answer `404 Not Found` in plain text. A missing directory
//! or `index.html` only disables the UI; the WebSocket bridge keeps working.

use std::path::Path;

use axum::handler::HandlerWithoutStateExt;
use axum::http::StatusCode;
use axum::routing::MethodRouter;
use axum::routing::get_service;
use tower_http::services::ServeDir;

/// Default document looked up for `/`.
pub const INDEX_FILE: &str = "index.html";

/// `404` fallback body.
pub async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}

/// Service serving `dir`, with `index.html` for directory requests.
pub fn service(dir: &Path) -> MethodRouter {
    get_service(ServeDir::new(dir).not_found_service(not_found.into_service()))
}

/// Logs why the UI will not be available, if it will not.
///
/// Returns `true` when `dir/index.html` exists.
pub fn check_dir(dir: &Path) -> bool {
    if !dir.is_dir() {
        tracing::warn!(dir = %dir.display(), "static directory not found; UI disabled");
        return false;
    }
    if !dir.join(INDEX_FILE).is_file() {
        tracing::warn!(dir = %dir.display(), "{INDEX_FILE} not found in static directory");
        return false;
    }
    true
}
