//! Per-connection pump between one WebSocket and the bridge task.
//!
//! Reads frames from the client and forwards them as bridge events, and
//! writes whatever the bridge queues for this client back to the socket.
//! The connect event is sent before any frame and the disconnect event
//! after the last one, so the bridge sees them in order.

use std::net::SocketAddr;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use crate::bridge::BridgeHandle;
use crate::domain::{ClientHandle, Outbound};

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Text and binary frames become bridge frames; ping/pong are left to
///   the transport.
/// - Queued [`Outbound::Text`] items are written as text frames.
/// - [`Outbound::Close`] closes the socket, e.g. after a rejection notice.
/// - At most `queue` messages wait for this socket; beyond that the bridge
///   drops the client.
pub async fn run_connection(
    socket: WebSocket,
    bridge: BridgeHandle,
    peer: SocketAddr,
    queue: usize,
) {
    let id = bridge.allocate_id();
    let (client, mut outbound) = ClientHandle::channel(id, queue);
    info!(client_id = %id, %peer, "websocket opened");

    if bridge.connect(client).await.is_err() {
        warn!(client_id = %id, "bridge unavailable; dropping connection");
        return;
    }

    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            // Incoming frame from client
            msg = ws_rx.next() => {
                let payload = match msg {
                    Some(Ok(Message::Text(text))) => text.as_str().as_bytes().to_vec(),
                    Some(Ok(Message::Binary(data))) => data.to_vec(),
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        warn!(client_id = %id, error = %e, "websocket error");
                        break;
                    }
                };
                if bridge.frame(id, payload).await.is_err() {
                    break;
                }
            }
            // Output queued by the bridge
            out = outbound.recv() => {
                match out {
                    Some(Outbound::Text(text)) => {
                        if ws_tx.send(Message::text(text)).await.is_err() {
                            break;
                        }
                    }
                    Some(Outbound::Close) | None => {
                        let _ = ws_tx.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
        }
    }

    drop(outbound);
    let _ = bridge.disconnect(id).await;
    debug!(client_id = %id, "websocket closed");
}
