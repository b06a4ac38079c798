use crate::traits::error::{ResockError, Result};
use serde_json::Value;
use tokio_tungstenite::tungstenite::Message;

/// Type alias for WebSocket messages
/// Can be Text or Binary data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsMessage {
    Text(String),
    Binary(Vec<u8>),
}

impl WsMessage {
    /// Get the message as text, if it is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            WsMessage::Text(s) => Some(s),
            WsMessage::Binary(_) => None,
        }
    }

    /// Get the message as binary, if it is binary
    pub fn as_binary(&self) -> Option<&[u8]> {
        match self {
            WsMessage::Text(_) => None,
            WsMessage::Binary(b) => Some(b),
        }
    }

    /// Check if message is text
    pub fn is_text(&self) -> bool {
        matches!(self, WsMessage::Text(_))
    }

    /// Check if message is binary
    pub fn is_binary(&self) -> bool {
        matches!(self, WsMessage::Binary(_))
    }

    /// Convert to a tungstenite frame for the wire
    pub(crate) fn into_tungstenite(self) -> Message {
        match self {
            WsMessage::Text(text) => Message::Text(text),
            WsMessage::Binary(data) => Message::Binary(data),
        }
    }

    /// Convert an incoming tungstenite frame, ignoring control frames
    pub(crate) fn from_tungstenite(message: Message) -> Option<Self> {
        match message {
            Message::Text(text) => Some(WsMessage::Text(text)),
            Message::Binary(data) => Some(WsMessage::Binary(data)),
            Message::Ping(_) | Message::Pong(_) | Message::Close(_) | Message::Frame(_) => None,
        }
    }
}

impl From<String> for WsMessage {
    fn from(text: String) -> Self {
        WsMessage::Text(text)
    }
}

impl From<&str> for WsMessage {
    fn from(text: &str) -> Self {
        WsMessage::Text(text.to_string())
    }
}

impl From<Vec<u8>> for WsMessage {
    fn from(data: Vec<u8>) -> Self {
        WsMessage::Binary(data)
    }
}

/// Payload delivered to the on-message callback
///
/// Messages the codec understands arrive as `Json`; anything the codec
/// declines to parse is delivered unchanged as `Text` or `Binary`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Structured value produced by the codec
    Json(Value),
    /// Raw text the codec did not parse
    Text(String),
    /// Raw binary frame
    Binary(Vec<u8>),
}

impl Payload {
    /// Get the payload as a JSON value, if it was decoded
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Payload::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Get the payload as raw text, if it was not decoded
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Check if the payload was decoded by the codec
    pub fn is_json(&self) -> bool {
        matches!(self, Payload::Json(_))
    }
}

/// Trait for translating application values to and from the wire
///
/// Implement this trait to control how outbound values are serialized
/// and how inbound frames are decoded before reaching the on-message
/// callback. Decode failure is never fatal: implementations fall back
/// to delivering the raw payload.
pub trait MessageCodec: Send + Sync {
    /// Encode an application value into a wire message
    ///
    /// # Arguments
    /// * `value` - The application value to encode
    ///
    /// # Returns
    /// * `Ok(WsMessage)` - The wire representation
    /// * `Err(ResockError)` - Encoding failed
    fn encode(&self, value: &Value) -> Result<WsMessage>;

    /// Decode a wire message into an application payload
    ///
    /// Must not fail: implementations return the raw payload when
    /// they cannot parse the message.
    fn decode(&self, message: WsMessage) -> Payload;
}

/// JSON codec: structured values travel as JSON text
///
/// Strings pass through the wire unchanged. Inbound text is parsed as
/// JSON; text that does not parse is delivered raw. Binary frames are
/// never parsed.
pub struct JsonCodec;

impl MessageCodec for JsonCodec {
    fn encode(&self, value: &Value) -> Result<WsMessage> {
        match value {
            Value::String(text) => Ok(WsMessage::Text(text.clone())),
            other => serde_json::to_string(other)
                .map(WsMessage::Text)
                .map_err(|e| ResockError::Encode(e.to_string())),
        }
    }

    fn decode(&self, message: WsMessage) -> Payload {
        match message {
            WsMessage::Text(text) => match serde_json::from_str::<Value>(&text) {
                Ok(value) => Payload::Json(value),
                Err(_) => Payload::Text(text),
            },
            WsMessage::Binary(data) => Payload::Binary(data),
        }
    }
}

/// Pass-through codec that never parses inbound frames
/// Useful for plain-text protocols or when parsing happens downstream
pub struct RawCodec;

impl MessageCodec for RawCodec {
    fn encode(&self, value: &Value) -> Result<WsMessage> {
        match value {
            Value::String(text) => Ok(WsMessage::Text(text.clone())),
            other => serde_json::to_string(other)
                .map(WsMessage::Text)
                .map_err(|e| ResockError::Encode(e.to_string())),
        }
    }

    fn decode(&self, message: WsMessage) -> Payload {
        match message {
            WsMessage::Text(text) => Payload::Text(text),
            WsMessage::Binary(data) => Payload::Binary(data),
        }
    }
}
