//! station-gateway server entry point.
//!
//! Starts the bridge task and the Axum HTTP server with the WebSocket
//! endpoint, the info endpoint and the static throttle UI.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use station_gateway::api::{self, handlers::static_files};
use station_gateway::app_state::AppState;
use station_gateway::bridge::{Bridge, BridgeHandle, spawn_bridge};
use station_gateway::config::GatewayConfig;
use station_gateway::interpreter::LoopbackInterpreter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = GatewayConfig::from_env().context("loading configuration")?;
    tracing::info!(addr = %config.listen_addr, "starting station-gateway");

    // The UI is optional; the bridge runs either way.
    static_files::check_dir(&config.static_dir);

    // Start the bridge task
    let bridge = Bridge::new(config.bridge_limits(), LoopbackInterpreter);
    let (bridge, bridge_task) = spawn_bridge(
        bridge,
        config.bridge_event_capacity,
        config.cleanup_interval,
    );

    let config = Arc::new(config);
    let app_state = AppState {
        bridge: bridge.clone(),
        config: Arc::clone(&config),
    };
    let app = api::build_app(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(
        addr = %config.listen_addr,
        ws_path = %config.ws_path,
        "server listening"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(bridge))
    .await
    .context("serving HTTP")?;

    let _ = bridge_task.await;
    tracing::info!("station-gateway stopped");

    Ok(())
}

/// Resolves on Ctrl-C after telling the bridge to close every client, so
/// open WebSocket connections do not hold the graceful shutdown open.
async fn shutdown_signal(bridge: BridgeHandle) {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::warn!("cannot listen for ctrl-c; running until killed");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
    let _ = bridge.shutdown().await;
}
