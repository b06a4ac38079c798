//! # Resock Traits
//!
//! Core traits and types for the resock WebSocket client library:
//!
//! - **MessageCodec**: Translate application values to/from the wire
//! - **ResockError**: Error taxonomy for connection and send failures
//!
//! The codec seam is the only pluggable boundary the client consumes on
//! the message path; everything else is configuration.

pub mod codec;
pub mod error;

// Re-export commonly used types
pub use codec::{JsonCodec, MessageCodec, Payload, RawCodec, WsMessage};
pub use error::{ResockError, Result};
