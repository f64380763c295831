//! Axum WebSocket upgrade handler.

use std::net::SocketAddr;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{ConnectInfo, State};
use axum::response::IntoResponse;

use super::connection::run_connection;
use crate::app_state::AppState;

/// `GET /ws` — Upgrade HTTP connection to WebSocket.
///
/// Admission is decided by the bridge once the upgrade completes, so a
/// client over the ceiling still gets a socket: it receives the rejection
/// notice on it and is then closed.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let bridge = state.bridge.clone();
    let queue = state.config.client_queue_capacity;
    ws.on_upgrade(move |socket| run_connection(socket, bridge, peer, queue))
}
