//! System endpoints: health check and bridge info.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};

/// Version string reported by `/api/info`.
pub const VERSION: &str = concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"));

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// Bridge info response.
///
/// Field names follow what browser throttles already expect.
#[derive(Debug, Serialize, ToSchema)]
pub struct InfoResponse {
    /// Gateway name and version.
    pub version: String,
    /// Currently connected WebSocket clients.
    pub clients: usize,
    /// Connection ceiling.
    #[serde(rename = "maxClients")]
    pub max_clients: usize,
}

/// `GET /api/info` — Connected clients and the connection ceiling.
///
/// # Errors
///
/// Returns [`GatewayError::BridgeUnavailable`] if the bridge task has
/// stopped.
#[utoipa::path(
    get,
    path = "/api/info",
    tag = "System",
    summary = "Bridge info",
    description = "Returns the gateway version, the number of connected WebSocket clients and the maximum allowed.",
    responses(
        (status = 200, description = "Bridge info", body = InfoResponse),
        (status = 503, description = "Bridge not running", body = ErrorResponse),
    )
)]
pub async fn info_handler(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, GatewayError> {
    let status = state.bridge.status().await?;
    Ok((
        StatusCode::OK,
        Json(InfoResponse {
            version: VERSION.to_string(),
            clients: status.clients,
            max_clients: status.max_clients,
        }),
    ))
}

/// System routes mounted at the root level.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/info", get(info_handler))
}
