//! Single-consumer event loop driving a [`Bridge`].
//!
//! Transport tasks never touch the bridge directly. They send
//! [`BridgeEvent`]s through a cloneable [`BridgeHandle`]; one task owns the
//! bridge, applies events in arrival order and runs the housekeeping tick.
//! Because that task is the only one mutating bridge state, two commands
//! never execute at the same time.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::controller::Bridge;
use super::messages::BridgeStatus;
use crate::domain::{ClientHandle, ConnectionId, IdAllocator};
use crate::error::GatewayError;
use crate::interpreter::CommandInterpreter;

/// Event consumed by the bridge task.
#[derive(Debug)]
pub enum BridgeEvent {
    /// A transport connection opened.
    Connect(ClientHandle),
    /// A transport connection closed.
    Disconnect(ConnectionId),
    /// A data frame arrived on a connection.
    Frame {
        /// Originating connection.
        id: ConnectionId,
        /// Raw payload.
        payload: Vec<u8>,
    },
    /// Server-originated notice for every client.
    Broadcast(String),
    /// Status query.
    Status(oneshot::Sender<BridgeStatus>),
    /// Stop the bridge and end the task.
    Shutdown,
}

/// Cloneable sender side of the bridge task.
#[derive(Debug, Clone)]
pub struct BridgeHandle {
    tx: mpsc::Sender<BridgeEvent>,
    ids: Arc<IdAllocator>,
}

impl BridgeHandle {
    /// Allocates the identity for a new transport connection.
    #[must_use]
    pub fn allocate_id(&self) -> ConnectionId {
        self.ids.allocate()
    }

    /// Reports a newly opened connection.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::BridgeUnavailable`] if the bridge task has
    /// stopped.
    pub async fn connect(&self, client: ClientHandle) -> Result<(), GatewayError> {
        self.send(BridgeEvent::Connect(client)).await
    }

    /// Reports a closed connection.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::BridgeUnavailable`] if the bridge task has
    /// stopped.
    pub async fn disconnect(&self, id: ConnectionId) -> Result<(), GatewayError> {
        self.send(BridgeEvent::Disconnect(id)).await
    }

    /// Forwards an inbound frame.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::BridgeUnavailable`] if the bridge task has
    /// stopped.
    pub async fn frame(&self, id: ConnectionId, payload: Vec<u8>) -> Result<(), GatewayError> {
        self.send(BridgeEvent::Frame { id, payload }).await
    }

    /// Sends `text` to every connected client.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::BridgeUnavailable`] if the bridge task has
    /// stopped.
    pub async fn broadcast(&self, text: impl Into<String>) -> Result<(), GatewayError> {
        self.send(BridgeEvent::Broadcast(text.into())).await
    }

    /// Fetches the current admission state.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::BridgeUnavailable`] if the bridge task has
    /// stopped.
    pub async fn status(&self) -> Result<BridgeStatus, GatewayError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(BridgeEvent::Status(reply_tx)).await?;
        reply_rx.await.map_err(|_| GatewayError::BridgeUnavailable)
    }

    /// Asks the bridge task to close every client and exit.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::BridgeUnavailable`] if the bridge task has
    /// already stopped.
    pub async fn shutdown(&self) -> Result<(), GatewayError> {
        self.send(BridgeEvent::Shutdown).await
    }

    /// Returns `true` once the bridge task has exited.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    async fn send(&self, event: BridgeEvent) -> Result<(), GatewayError> {
        self.tx
            .send(event)
            .await
            .map_err(|_| GatewayError::BridgeUnavailable)
    }
}

/// Starts `bridge` on its own task.
///
/// `capacity` bounds the event queue; transport readers wait when it is
/// full. `tick_every` is the housekeeping interval.
#[must_use]
pub fn spawn_bridge<I: CommandInterpreter>(
    bridge: Bridge<ClientHandle, I>,
    capacity: usize,
    tick_every: Duration,
) -> (BridgeHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let handle = BridgeHandle {
        tx,
        ids: Arc::new(IdAllocator::new()),
    };
    let task = tokio::spawn(run_bridge(bridge, rx, tick_every));
    (handle, task)
}

async fn run_bridge<I: CommandInterpreter>(
    mut bridge: Bridge<ClientHandle, I>,
    mut rx: mpsc::Receiver<BridgeEvent>,
    tick_every: Duration,
) {
    bridge.start();

    let mut ticker = tokio::time::interval(tick_every.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            event = rx.recv() => {
                match event {
                    Some(BridgeEvent::Shutdown) | None => break,
                    Some(event) => dispatch(&mut bridge, event),
                }
            }
            _ = ticker.tick() => {
                bridge.tick();
            }
        }
    }

    bridge.stop();
}

fn dispatch<I: CommandInterpreter>(bridge: &mut Bridge<ClientHandle, I>, event: BridgeEvent) {
    match event {
        BridgeEvent::Connect(client) => {
            bridge.on_connect(client);
        }
        BridgeEvent::Disconnect(id) => {
            bridge.on_disconnect(id);
        }
        BridgeEvent::Frame { id, payload } => {
            bridge.on_frame(id, &payload);
        }
        BridgeEvent::Broadcast(text) => {
            let reached = bridge.broadcast(&text);
            tracing::debug!(reached, "broadcast sent");
        }
        BridgeEvent::Status(reply) => {
            let _ = reply.send(bridge.status());
        }
        BridgeEvent::Shutdown => {}
    }
}
