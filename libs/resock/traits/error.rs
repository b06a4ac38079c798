use thiserror::Error;

/// Main error type for resock
#[derive(Error, Debug)]
pub enum ResockError {
    /// The configured address could not be turned into a connection request
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// WebSocket transport error
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Message encoding error
    #[error("Encode error: {0}")]
    Encode(String),

    /// Channel send error (the supervisor task is gone)
    #[error("Channel send error: {0}")]
    ChannelSend(String),
}

/// Result type for resock operations
pub type Result<T> = std::result::Result<T, ResockError>;
