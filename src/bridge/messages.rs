//! Client-visible JSON notices emitted by the bridge itself.
//!
//! Interpreter output and broadcasts are forwarded verbatim; only the
//! connect-time acknowledgements are generated here.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::ConnectionId;

/// Error text sent to a client refused at the connection ceiling.
pub const MAX_CLIENTS_REACHED: &str = "Max clients reached";

/// Sent once to every admitted client.
///
/// ```json
/// {"connected":true,"clientId":3}
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Welcome {
    /// Always `true`.
    pub connected: bool,
    /// Identity assigned to the connection.
    #[serde(rename = "clientId")]
    pub client_id: ConnectionId,
}

impl Welcome {
    /// Builds the welcome notice for `client_id`.
    #[must_use]
    pub const fn new(client_id: ConnectionId) -> Self {
        Self {
            connected: true,
            client_id,
        }
    }
}

/// Sent to a client refused at admission, right before the close.
///
/// ```json
/// {"error":"Max clients reached"}
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Rejection {
    /// Human-readable reason.
    pub error: &'static str,
}

impl Rejection {
    /// Rejection for a full registry.
    #[must_use]
    pub const fn max_clients() -> Self {
        Self {
            error: MAX_CLIENTS_REACHED,
        }
    }
}

/// Snapshot of the bridge state, served by the info endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct BridgeStatus {
    /// Currently admitted clients.
    pub clients: usize,
    /// Connection ceiling.
    pub max_clients: usize,
    /// Whether the bridge is between `start` and `stop`.
    pub enabled: bool,
}

/// Serializes a notice to its wire text.
pub(crate) fn to_wire<T: Serialize>(notice: &T) -> String {
    serde_json::to_string(notice).unwrap_or_default()
}
