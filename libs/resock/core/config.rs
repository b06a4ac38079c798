use std::sync::Arc;
use std::time::Duration;

use crate::core::callbacks::Callbacks;
use crate::traits::MessageCodec;

/// Delay between automatic reconnection attempts when none is configured
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(3000);

/// Automatic reconnection attempt budget when none is configured
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: usize = 5;

/// Configuration for a [`WebSocketClient`](crate::core::client::WebSocketClient)
///
/// Built once by the type-state builder and owned by the supervisor for
/// its lifetime; nothing here changes after construction.
pub struct ClientConfig {
    /// WebSocket URL (ws:// or wss://)
    pub(crate) url: String,

    /// Sub-protocols offered during the handshake, in preference order
    pub(crate) protocols: Vec<String>,

    /// Delay between automatic reconnection attempts
    pub(crate) reconnect_delay: Duration,

    /// Maximum automatic reconnection attempts per failure sequence;
    /// 0 disables automatic retry entirely
    pub(crate) max_reconnect_attempts: usize,

    /// Codec translating application values to and from the wire
    pub(crate) codec: Arc<dyn MessageCodec>,

    /// Optional lifecycle callback slots
    pub(crate) callbacks: Callbacks,
}

impl ClientConfig {
    /// Get a reference to the URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Sub-protocols offered during the handshake
    pub fn protocols(&self) -> &[String] {
        &self.protocols
    }

    /// Delay between automatic reconnection attempts
    pub fn reconnect_delay(&self) -> Duration {
        self.reconnect_delay
    }

    /// Maximum automatic reconnection attempts per failure sequence
    pub fn max_reconnect_attempts(&self) -> usize {
        self.max_reconnect_attempts
    }
}
