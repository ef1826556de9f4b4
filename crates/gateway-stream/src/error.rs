//! Event streaming error types.

use thiserror::Error;

/// Event streaming error type.
#[derive(Error, Debug)]
pub enum StreamError {
    /// Durable store failure; the event was not recorded.
    #[error("Durable store error: {0}")]
    Wal(#[from] gateway_wal::WalError),

    /// WebSocket transport error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON encode/decode error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The configured token cannot be sent as an Authorization header.
    #[error("Invalid authorization token")]
    InvalidToken,
}

/// Result type alias using StreamError.
pub type StreamResult<T> = Result<T, StreamError>;
