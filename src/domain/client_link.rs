//! Outbound capability the bridge holds for each client.
//!
//! The transport owns the socket; the bridge only keeps a [`ClientLink`]
//! through which it can push text, force a close and check liveness.
//! [`ClientHandle`] is the channel-backed implementation used by the
//! WebSocket layer: the bridge enqueues [`Outbound`] items and the
//! connection's writer task drains them onto the socket.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::warn;

use super::ConnectionId;

/// Non-owning handle to one client connection.
pub trait ClientLink {
    /// Identity of the connection.
    fn id(&self) -> ConnectionId;

    /// Returns `true` while the transport side of the connection is open.
    fn is_live(&self) -> bool;

    /// Queues a text message. Returns `false` if the connection is gone;
    /// the message is then dropped.
    fn send_text(&self, text: &str) -> bool;

    /// Requests the transport to close the connection.
    fn close(&self);
}

/// Item queued for a connection's writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// A text frame.
    Text(String),
    /// Close the socket after everything queued before it has been written.
    Close,
}

/// [`ClientLink`] backed by a bounded MPSC channel.
///
/// Sends never wait. A client whose queue is full is marked overflowed:
/// it stops being live, the next sweep reclaims it, and dropping the
/// handle ends the writer task once the queue drains.
#[derive(Debug)]
pub struct ClientHandle {
    id: ConnectionId,
    tx: mpsc::Sender<Outbound>,
    overflowed: AtomicBool,
}

impl ClientHandle {
    /// Creates a handle queuing at most `capacity` items, and the receiver
    /// its writer task must drain.
    #[must_use]
    pub fn channel(id: ConnectionId, capacity: usize) -> (Self, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = Self {
            id,
            tx,
            overflowed: AtomicBool::new(false),
        };
        (handle, rx)
    }

    fn enqueue(&self, item: Outbound) -> bool {
        match self.tx.try_send(item) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                if !self.overflowed.swap(true, Ordering::Relaxed) {
                    warn!(client_id = %self.id, "outbound queue full; dropping client");
                }
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }
}

impl ClientLink for ClientHandle {
    fn id(&self) -> ConnectionId {
        self.id
    }

    fn is_live(&self) -> bool {
        !self.tx.is_closed() && !self.overflowed.load(Ordering::Relaxed)
    }

    fn send_text(&self, text: &str) -> bool {
        self.is_live() && self.enqueue(Outbound::Text(text.to_string()))
    }

    fn close(&self) {
        let _ = self.enqueue(Outbound::Close);
    }
}
