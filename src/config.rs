//! Gateway configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Values are read once at startup and
//! stay fixed for the life of the process.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::bridge::BridgeLimits;
use crate::domain::response_accumulator::MIN_CAPACITY;
use crate::error::GatewayError;

/// Top-level gateway configuration.
///
/// Loaded once at startup via [`GatewayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:80`).
    pub listen_addr: SocketAddr,

    /// Path of the WebSocket endpoint.
    pub ws_path: String,

    /// Directory served at `/`.
    pub static_dir: PathBuf,

    /// Maximum number of concurrent WebSocket clients.
    pub max_clients: usize,

    /// Maximum inbound command length in bytes.
    pub max_command_len: usize,

    /// Size of the per-message output buffer.
    pub response_buffer_size: usize,

    /// Interval of the dead-client sweep.
    pub cleanup_interval: Duration,

    /// Capacity of the bridge event queue.
    pub bridge_event_capacity: usize,

    /// Outbound messages queued per client before it is dropped as too slow.
    pub client_queue_capacity: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        let limits = BridgeLimits::default();
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 80)),
            ws_path: "/ws".to_string(),
            static_dir: PathBuf::from("./data"),
            max_clients: limits.max_clients,
            max_command_len: limits.max_command_len,
            response_buffer_size: limits.response_buffer_size,
            cleanup_interval: Duration::from_millis(1000),
            bridge_event_capacity: 1024,
            client_queue_capacity: 64,
        }
    }
}

impl GatewayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to the defaults of [`GatewayConfig::default`] when a
    /// variable is not set. Calls `dotenvy::dotenv().ok()` to optionally
    /// load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidConfig`] if `LISTEN_ADDR` cannot be
    /// parsed as a [`SocketAddr`] or a limit fails [`validate`](Self::validate).
    pub fn from_env() -> Result<Self, GatewayError> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let listen_addr = match std::env::var("LISTEN_ADDR") {
            Ok(raw) => raw
                .parse()
                .map_err(|e| GatewayError::InvalidConfig(format!("LISTEN_ADDR {raw:?}: {e}")))?,
            Err(_) => defaults.listen_addr,
        };

        let ws_path = std::env::var("WS_PATH").unwrap_or(defaults.ws_path);
        let static_dir = std::env::var("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.static_dir);

        let max_clients = parse_env("WS_MAX_CLIENTS", defaults.max_clients);
        let max_command_len = parse_env("WS_COMMAND_BUFFER_SIZE", defaults.max_command_len);
        let response_buffer_size =
            parse_env("WS_RESPONSE_BUFFER_SIZE", defaults.response_buffer_size);
        let cleanup_interval = Duration::from_millis(parse_env("WS_CLEANUP_INTERVAL_MS", 1000));
        let bridge_event_capacity =
            parse_env("BRIDGE_EVENT_CAPACITY", defaults.bridge_event_capacity);
        let client_queue_capacity =
            parse_env("WS_CLIENT_QUEUE_SIZE", defaults.client_queue_capacity);

        let config = Self {
            listen_addr,
            ws_path,
            static_dir,
            max_clients,
            max_command_len,
            response_buffer_size,
            cleanup_interval,
            bridge_event_capacity,
            client_queue_capacity,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks that every limit is usable.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidConfig`] naming the first offending key.
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.max_clients == 0 {
            return Err(invalid("WS_MAX_CLIENTS must be greater than 0"));
        }
        if self.max_command_len == 0 {
            return Err(invalid("WS_COMMAND_BUFFER_SIZE must be greater than 0"));
        }
        if self.response_buffer_size < MIN_CAPACITY {
            return Err(invalid(&format!(
                "WS_RESPONSE_BUFFER_SIZE must be at least {MIN_CAPACITY}"
            )));
        }
        if self.client_queue_capacity == 0 {
            return Err(invalid("WS_CLIENT_QUEUE_SIZE must be greater than 0"));
        }
        if self.cleanup_interval.is_zero() {
            return Err(invalid("WS_CLEANUP_INTERVAL_MS must be greater than 0"));
        }
        if !self.ws_path.starts_with('/') {
            return Err(invalid("WS_PATH must start with '/'"));
        }
        Ok(())
    }

    /// Limits handed to the bridge.
    #[must_use]
    pub const fn bridge_limits(&self) -> BridgeLimits {
        BridgeLimits {
            max_clients: self.max_clients,
            max_command_len: self.max_command_len,
            response_buffer_size: self.response_buffer_size,
        }
    }
}

fn invalid(msg: &str) -> GatewayError {
    GatewayError::InvalidConfig(msg.to_string())
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
