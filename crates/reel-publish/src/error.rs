//! Publish error types.

use thiserror::Error;

/// Result type for publish operations.
pub type PublishResult<T> = Result<T, PublishError>;

/// Errors that can occur while publishing.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The refresh token or access token was rejected; re-authorization is needed.
    #[error("Credentials expired or revoked: {0}")]
    AuthExpired(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Invalid credentials document: {0}")]
    InvalidCredentials(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl PublishError {
    pub fn auth_expired(msg: impl Into<String>) -> Self {
        Self::AuthExpired(msg.into())
    }

    pub fn upload_failed(msg: impl Into<String>) -> Self {
        Self::UploadFailed(msg.into())
    }

    pub fn invalid_credentials(msg: impl Into<String>) -> Self {
        Self::InvalidCredentials(msg.into())
    }

    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::AuthExpired(_))
    }
}
