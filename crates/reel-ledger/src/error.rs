//! Ledger error types.

use thiserror::Error;

pub type LedgerResult<T> = Result<T, LedgerError>;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Ledger store unavailable: {0}")]
    Unavailable(String),

    #[error("Ledger store returned {status}: {message}")]
    Store { status: u16, message: String },

    #[error("Invalid ledger response: {0}")]
    InvalidResponse(String),

    #[error("Ledger request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Ledger configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LedgerError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True for every error caused by store reachability or store answers.
    ///
    /// Callers must treat a transient failure of `contains` as "unknown",
    /// never as "not present".
    pub fn is_transient(&self) -> bool {
        !matches!(self, LedgerError::Config(_))
    }
}
