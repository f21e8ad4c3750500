//! Error types for the chat subsystem.

use thiserror::Error;

/// Chat subsystem error type.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Invalid configuration or unsupported values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Rejected caller input (empty title, blank credentials).
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// No token is available for an authenticated call.
    #[error("authentication required")]
    AuthRequired,
    /// The server rejected the token (HTTP 401 or equivalent).
    #[error("authentication failed")]
    AuthFailed,
    /// The server was reachable but reported failure.
    #[error("server rejected the request: {0}")]
    ServerRejected(String),
    /// The request could not complete at the transport level.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    /// `SQLite` storage error (sync).
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// `SQLite` storage error (async).
    #[error("tokio-rusqlite error: {0}")]
    TokioSqlite(#[from] tokio_rusqlite::Error),
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// URL parse error.
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
}

impl ChatError {
    /// Check whether this error must trigger the deferred forced logout.
    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self, Self::AuthRequired | Self::AuthFailed)
    }
}

/// Convenience result alias for chat operations.
pub type ChatResult<T> = Result<T, ChatError>;
