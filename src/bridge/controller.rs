//! Bridge controller: connection lifecycle, command dispatch and broadcast.
//!
//! [`Bridge`] is a plain synchronous state machine. The transport feeds it
//! connect, disconnect and frame events; the periodic tick reclaims
//! connections the transport dropped without telling us. All of it runs on
//! one task (see [`super::actor`]), so nothing here locks.
//!
//! Per connection:
//!
//! ```text
//! DISCONNECTED ──admit──▶ CONNECTED ──frame──▶ PROCESSING ──flush──▶ CONNECTED
//!       ▲                     │                                        │
//!       └──── disconnect ─────┴──────────────── disconnect ────────────┘
//! ```

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use super::messages::{BridgeStatus, Rejection, Welcome, to_wire};
use crate::domain::{
    ClientLink, ConnectionId, ConnectionRegistry, ResponseAccumulator, normalize,
};
use crate::interpreter::CommandInterpreter;

/// Limits fixed when the bridge is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeLimits {
    /// Maximum concurrent clients.
    pub max_clients: usize,
    /// Maximum inbound frame length, in bytes, before trimming.
    pub max_command_len: usize,
    /// Size of the per-command output buffer.
    pub response_buffer_size: usize,
}

impl Default for BridgeLimits {
    fn default() -> Self {
        Self {
            max_clients: 5,
            max_command_len: 128,
            response_buffer_size: 256,
        }
    }
}

/// Outcome of a connect attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The client was registered and welcomed.
    Accepted,
    /// The registry was full or the bridge stopped; the client was closed.
    Rejected,
}

/// Multiplexes many client links onto one interpreter.
#[derive(Debug)]
pub struct Bridge<L: ClientLink, I: CommandInterpreter> {
    registry: ConnectionRegistry,
    clients: BTreeMap<ConnectionId, L>,
    interpreter: I,
    limits: BridgeLimits,
    enabled: bool,
}

impl<L: ClientLink, I: CommandInterpreter> Bridge<L, I> {
    /// Creates a stopped bridge.
    #[must_use]
    pub fn new(limits: BridgeLimits, interpreter: I) -> Self {
        Self {
            registry: ConnectionRegistry::new(limits.max_clients),
            clients: BTreeMap::new(),
            interpreter,
            limits,
            enabled: false,
        }
    }

    /// Marks the bridge as running.
    pub fn start(&mut self) {
        self.enabled = true;
        info!(
            max_clients = self.limits.max_clients,
            max_command_len = self.limits.max_command_len,
            "bridge started"
        );
    }

    /// Closes every registered client and marks the bridge as stopped.
    pub fn stop(&mut self) {
        for link in self.clients.values() {
            link.close();
        }
        let closed = self.clients.len();
        self.clients.clear();
        self.registry.clear();
        self.enabled = false;
        info!(closed, "bridge stopped");
    }

    /// Returns `true` between [`start`](Self::start) and [`stop`](Self::stop).
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Admits `link` or turns it away.
    ///
    /// Accepted clients receive `{"connected":true,"clientId":<id>}`.
    /// Rejected ones receive `{"error":"Max clients reached"}` and are
    /// closed; they are never registered, so their later disconnect does
    /// not touch the count. While the bridge is stopped every client is
    /// closed without a notice.
    pub fn on_connect(&mut self, link: L) -> Admission {
        let id = link.id();
        if !self.enabled {
            link.close();
            debug!(client_id = %id, "connect while stopped refused");
            return Admission::Rejected;
        }
        if self.clients.contains_key(&id) {
            warn!(client_id = %id, "duplicate connect ignored");
            return Admission::Accepted;
        }

        if !self.registry.admit() {
            link.send_text(&to_wire(&Rejection::max_clients()));
            link.close();
            warn!(client_id = %id, "client rejected (max reached)");
            return Admission::Rejected;
        }

        link.send_text(&to_wire(&Welcome::new(id)));
        self.clients.insert(id, link);
        info!(
            client_id = %id,
            count = self.registry.current_count(),
            "client connected"
        );
        Admission::Accepted
    }

    /// Forgets `id`, releasing its slot if it was admitted.
    ///
    /// Returns `true` if the connection was registered.
    pub fn on_disconnect(&mut self, id: ConnectionId) -> bool {
        if self.clients.remove(&id).is_none() {
            return false;
        }
        self.registry.release();
        info!(
            client_id = %id,
            count = self.registry.current_count(),
            "client disconnected"
        );
        true
    }

    /// Runs one inbound frame through the interpreter.
    ///
    /// Frames from unknown connections, and frames that normalize to
    /// nothing (empty, blank, oversized), are dropped without a reply.
    /// Returns the number of messages sent back to the client.
    pub fn on_frame(&mut self, id: ConnectionId, payload: &[u8]) -> usize {
        let Some(link) = self.clients.get(&id) else {
            debug!(client_id = %id, "frame from unregistered client dropped");
            return 0;
        };
        let Some(command) = normalize(payload, self.limits.max_command_len) else {
            debug!(client_id = %id, len = payload.len(), "frame dropped");
            return 0;
        };

        debug!(client_id = %id, cmd = %command, len = command.len(), "command received");
        let mut out = ResponseAccumulator::new(link, self.limits.response_buffer_size);
        self.interpreter.execute(&command, &mut out);
        out.flush();
        out.emitted()
    }

    /// Sends `text` verbatim to every live client.
    ///
    /// No-op while the bridge is stopped or nobody is connected. Returns
    /// the number of clients reached.
    pub fn broadcast(&self, text: &str) -> usize {
        if !self.enabled || self.registry.current_count() == 0 {
            return 0;
        }
        self.clients
            .values()
            .filter(|link| link.is_live())
            .filter(|link| link.send_text(text))
            .count()
    }

    /// Reclaims clients whose transport went away silently.
    ///
    /// Returns how many were reclaimed.
    pub fn tick(&mut self) -> usize {
        let before = self.clients.len();
        self.clients.retain(|id, link| {
            let live = link.is_live();
            if !live {
                debug!(client_id = %id, "reclaiming dead client");
            }
            live
        });
        let reaped = before - self.clients.len();
        for _ in 0..reaped {
            self.registry.release();
        }
        if reaped > 0 {
            info!(
                reaped,
                count = self.registry.current_count(),
                "dead clients reclaimed"
            );
        }
        reaped
    }

    /// Returns `true` if `id` is currently registered.
    #[must_use]
    pub fn is_connected(&self, id: ConnectionId) -> bool {
        self.clients.contains_key(&id)
    }

    /// Current admission state.
    #[must_use]
    pub fn status(&self) -> BridgeStatus {
        BridgeStatus {
            clients: self.registry.current_count(),
            max_clients: self.registry.ceiling(),
            enabled: self.enabled,
        }
    }

    /// Read access to the connection registry.
    #[must_use]
    pub const fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }
}
