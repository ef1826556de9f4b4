//! Durable queue error types.

use thiserror::Error;

/// Durable queue error type.
#[derive(Error, Debug)]
pub enum WalError {
    /// IO error creating the store directory
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// SQLite error
    #[error("Store error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error
    #[error("Pool error: {0}")]
    Pool(String),
}

/// Result type alias using WalError.
pub type WalResult<T> = Result<T, WalError>;
