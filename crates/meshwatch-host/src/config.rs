//! Host session configuration

use crate::events::{DEFAULT_EVENT_BUFFER, OverflowPolicy};

/// Listen address used when the configured one fails to parse
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:9020";

/// Agent string the observer announces about itself
pub const DEFAULT_AGENT: &str = concat!("meshwatch/", env!("CARGO_PKG_VERSION"));

/// Host session configuration
///
/// `listen_addr` is kept as text on purpose: an unparseable address is a
/// recoverable condition that falls back to [`DEFAULT_LISTEN_ADDR`] with a
/// logged warning rather than aborting session construction.
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Listen address for the network endpoint (`ip:port`)
    pub listen_addr: String,

    /// Agent string announced to remote peers during handshake
    pub agent: String,

    /// Capacity of the connection-event buffer
    pub event_buffer: usize,

    /// Policy applied when the event buffer is full
    pub overflow: OverflowPolicy,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            // Port 0 (auto-select) in tests to avoid port conflicts
            #[cfg(test)]
            listen_addr: "127.0.0.1:0".to_string(),
            #[cfg(not(test))]
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            agent: DEFAULT_AGENT.to_string(),
            event_buffer: DEFAULT_EVENT_BUFFER,
            overflow: OverflowPolicy::default(),
        }
    }
}
