//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::bridge::BridgeHandle;
use crate::config::GatewayConfig;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Sender side of the bridge task.
    pub bridge: BridgeHandle,
    /// Configuration the gateway was started with.
    pub config: Arc<GatewayConfig>,
}
