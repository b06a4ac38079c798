//! Core client machinery: supervisor, state, queue, configuration.

pub mod builder;
pub mod callbacks;
pub mod client;
pub mod config;
pub mod connection_state;
pub(crate) mod queue;

// Re-export main types
pub use builder::{states, ClientBuilder};
pub use callbacks::{CloseEvent, OnClose, OnError, OnMessage, OnOpen};
pub use client::{Metrics, WebSocketClient};
pub use config::{ClientConfig, DEFAULT_MAX_RECONNECT_ATTEMPTS, DEFAULT_RECONNECT_DELAY};
pub use connection_state::{AtomicConnectionState, AtomicMetrics, ConnectionState};

// Re-export traits for convenience
pub use crate::traits::*;

/// Create a new WebSocket client builder
///
/// This is a convenience function for starting the builder pattern.
///
/// # Example
/// ```ignore
/// let client = resock::builder()
///     .url("wss://api.example.com/stream")
///     .on_open(|| println!("connected"))
///     .on_message(|payload| println!("got {:?}", payload))
///     .build();
/// ```
pub fn builder() -> ClientBuilder<states::NoUrl> {
    ClientBuilder::new()
}
