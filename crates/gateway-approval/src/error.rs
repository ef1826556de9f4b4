//! Approval gateway error types.

use thiserror::Error;

/// Approval gateway error type.
#[derive(Error, Debug)]
pub enum ApprovalError {
    /// The gateway is administratively disabled.
    #[error("Approval gateway is not enabled")]
    Disabled,

    /// A blocking call exceeded its wait bound. Distinct from a remote
    /// denial; the underlying async call still completes and is discarded.
    #[error("Timeout waiting for API response")]
    Timeout,

    /// The remote service answered with something other than ALLOW.
    #[error("{0}")]
    Denied(String),

    /// A caller-supplied argument failed validation before any call.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The remote answered 200/ALLOW but the body is missing expected
    /// fields for this operation.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// HTTP client construction error
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error spawning completion workers
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Event streaming error
    #[error("Stream error: {0}")]
    Stream(#[from] gateway_stream::StreamError),
}

/// Result type alias using ApprovalError.
pub type ApiResult<T> = Result<T, ApprovalError>;
