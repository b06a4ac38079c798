pub mod states;

use std::sync::Arc;
use std::time::Duration;

use states::*;

use crate::core::callbacks::{Callbacks, CloseEvent};
use crate::core::client::WebSocketClient;
use crate::core::config::{ClientConfig, DEFAULT_MAX_RECONNECT_ATTEMPTS, DEFAULT_RECONNECT_DELAY};
use crate::traits::{JsonCodec, MessageCodec, Payload, ResockError};

/// Type-state builder for [`WebSocketClient`]
///
/// The URL is the only required field and is enforced by the type
/// system: `build()` exists only once `url()` has been called. Every
/// other field has a default (3 s reconnect delay, 5 reconnect
/// attempts, JSON codec, no sub-protocols, no callbacks).
///
/// # Example
/// ```ignore
/// let client = resock::builder()
///     .url("wss://api.example.com/stream")
///     .reconnect_delay(Duration::from_secs(1))
///     .max_reconnect_attempts(10)
///     .on_message(|payload| println!("got {:?}", payload))
///     .build();
///
/// client.connect()?;
/// client.send("hello")?;
/// ```
pub struct ClientBuilder<U>
where
    U: UrlState,
{
    _state: TypeState<U>,
    url: Option<String>,
    protocols: Vec<String>,
    reconnect_delay: Duration,
    max_reconnect_attempts: usize,
    codec: Option<Arc<dyn MessageCodec>>,
    callbacks: Callbacks,
}

impl ClientBuilder<NoUrl> {
    /// Create a new builder instance
    pub fn new() -> Self {
        Self {
            _state: TypeState::new(),
            url: None,
            protocols: Vec::new(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            codec: None,
            callbacks: Callbacks::default(),
        }
    }

    /// Set the WebSocket URL (required)
    pub fn url(self, url: impl Into<String>) -> ClientBuilder<HasUrl> {
        ClientBuilder {
            _state: TypeState::new(),
            url: Some(url.into()),
            protocols: self.protocols,
            reconnect_delay: self.reconnect_delay,
            max_reconnect_attempts: self.max_reconnect_attempts,
            codec: self.codec,
            callbacks: self.callbacks,
        }
    }
}

impl Default for ClientBuilder<NoUrl> {
    fn default() -> Self {
        Self::new()
    }
}

// Optional configuration, available in any state
impl<U> ClientBuilder<U>
where
    U: UrlState,
{
    /// Offer a sub-protocol during the handshake
    ///
    /// May be called repeatedly; protocols are offered in call order.
    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocols.push(protocol.into());
        self
    }

    /// Set the delay between automatic reconnection attempts
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Set the automatic reconnection attempt budget
    ///
    /// 0 disables automatic retry: the client stays disconnected after
    /// a close until `connect()` is called again.
    pub fn max_reconnect_attempts(mut self, attempts: usize) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    /// Replace the default JSON codec
    pub fn codec(mut self, codec: impl MessageCodec + 'static) -> Self {
        self.codec = Some(Arc::new(codec));
        self
    }

    /// Invoked when the connection reaches the open state
    pub fn on_open(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.callbacks.on_open = Some(Arc::new(callback));
        self
    }

    /// Invoked when the connection closes, with the close reason
    pub fn on_close(mut self, callback: impl Fn(&CloseEvent) + Send + Sync + 'static) -> Self {
        self.callbacks.on_close = Some(Arc::new(callback));
        self
    }

    /// Invoked when the transport reports an error
    pub fn on_error(mut self, callback: impl Fn(&ResockError) + Send + Sync + 'static) -> Self {
        self.callbacks.on_error = Some(Arc::new(callback));
        self
    }

    /// Invoked for every inbound message, decoded or raw
    pub fn on_message(mut self, callback: impl Fn(Payload) + Send + Sync + 'static) -> Self {
        self.callbacks.on_message = Some(Arc::new(callback));
        self
    }
}

// Build method - only available once the URL is set
impl ClientBuilder<HasUrl> {
    /// Build the client and spawn its supervisor task
    ///
    /// Must be called from within a tokio runtime. The client starts
    /// disconnected; call `connect()` to establish the connection.
    pub fn build(self) -> WebSocketClient {
        let config = ClientConfig {
            url: self.url.expect("URL is set in this builder state"),
            protocols: self.protocols,
            reconnect_delay: self.reconnect_delay,
            max_reconnect_attempts: self.max_reconnect_attempts,
            codec: self.codec.unwrap_or_else(|| Arc::new(JsonCodec)),
            callbacks: self.callbacks,
        };

        WebSocketClient::new(config)
    }
}
