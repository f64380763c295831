//! HTTP layer: route handlers, OpenAPI document and router composition.
//!
//! The WebSocket endpoint lives in [`crate::ws`]; [`build_app`] mounts it
//! next to the HTTP routes and the static UI.

pub mod handlers;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::app_state::AppState;
use crate::ws::handler::ws_handler;

/// OpenAPI document for the HTTP endpoints.
#[derive(Debug, OpenApi)]
#[openapi(
    info(description = "WebSocket gateway for a command station interpreter"),
    paths(handlers::system::health_handler, handlers::system::info_handler),
    components(schemas(
        handlers::system::HealthResponse,
        handlers::system::InfoResponse,
        crate::error::ErrorResponse,
        crate::error::ErrorBody,
    )),
    tags((name = "System", description = "Health and bridge status"))
)]
pub struct ApiDoc;

/// Builds the router with all HTTP endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new().merge(handlers::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}

/// Builds the complete application: HTTP routes, the WebSocket endpoint at
/// `config.ws_path` and the static UI as fallback.
pub fn build_app(state: AppState) -> Router {
    let ws_path = state.config.ws_path.clone();
    let static_dir = state.config.static_dir.clone();

    Router::new()
        .merge(build_router())
        .route(&ws_path, get(ws_handler))
        .fallback_service(handlers::static_files::service(&static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::bridge::{Bridge, spawn_bridge};
    use crate::config::GatewayConfig;
    use crate::interpreter::LoopbackInterpreter;

    fn app(max_clients: usize) -> Router {
        let config = GatewayConfig {
            max_clients,
            static_dir: "/nonexistent".into(),
            ..GatewayConfig::default()
        };
        let (bridge, _task) = spawn_bridge(
            Bridge::new(config.bridge_limits(), LoopbackInterpreter),
            8,
            Duration::from_secs(1),
        );
        build_app(AppState {
            bridge,
            config: Arc::new(config),
        })
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let Ok(request) = Request::get(uri).body(Body::empty()) else {
            panic!("bad request");
        };
        let Ok(response) = app.oneshot(request).await else {
            panic!("router failed");
        };
        let status = response.status();
        let Ok(body) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
            panic!("body read failed");
        };
        (status, body.to_vec())
    }

    #[test]
    fn openapi_lists_system_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/health"));
        assert!(doc.paths.paths.contains_key("/api/info"));
    }

    #[tokio::test]
    async fn info_reports_empty_bridge() {
        let (status, body) = get(app(5), "/api/info").await;
        assert_eq!(status, StatusCode::OK);
        let Ok(json) = serde_json::from_slice::<serde_json::Value>(&body) else {
            panic!("body is not JSON");
        };
        assert_eq!(json["clients"], 0);
        assert_eq!(json["maxClients"], 5);
        assert_eq!(json["version"], handlers::system::VERSION);
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (status, _) = get(app(1), "/health").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_path_falls_back_to_404() {
        let (status, body) = get(app(1), "/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, b"Not Found");
    }
}
