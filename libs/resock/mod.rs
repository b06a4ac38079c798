//! # Resock
//!
//! A resilient persistent-connection WebSocket client: one logical
//! duplex message stream over an unreliable transport.
//!
//! ## Features
//!
//! - **Bounded automatic reconnection**: configurable delay and attempt
//!   budget, reset on every successful connection
//! - **Durable send path**: messages sent while disconnected are queued
//!   and flushed in submission order once the connection comes up
//! - **Single-writer supervisor**: all lifecycle state lives in one task
//!   per client, callers never block
//! - **Pluggable codec**: JSON decoding with raw fallback by default,
//!   pass-through available
//! - **Type-state builder**: the URL is required at compile time
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> resock::Result<()> {
//!     let client = resock::builder()
//!         .url("wss://api.example.com/stream")
//!         .reconnect_delay(Duration::from_secs(2))
//!         .max_reconnect_attempts(10)
//!         .on_open(|| println!("connected"))
//!         .on_message(|payload| println!("got {:?}", payload))
//!         .on_close(|event| println!("closed: {}", event.reason))
//!         .build();
//!
//!     client.connect()?;
//!
//!     // Queued if the connection is not up yet, delivered in order
//!     client.send("hello")?;
//!     client.send_json(&serde_json::json!({ "op": "subscribe" }))?;
//!
//!     tokio::signal::ctrl_c().await.ok();
//!     client.shutdown().await
//! }
//! ```

pub mod core;
pub mod traits;

// Re-export all traits
pub use traits::*;

// Re-export core client functionality
pub use core::{
    builder, client, config, connection_state,
    builder::ClientBuilder,
    callbacks::CloseEvent,
    client::{Metrics, WebSocketClient},
    config::ClientConfig,
    connection_state::{AtomicConnectionState, AtomicMetrics, ConnectionState},
};

/// Type alias for Result with ResockError
pub type Result<T> = std::result::Result<T, traits::ResockError>;
