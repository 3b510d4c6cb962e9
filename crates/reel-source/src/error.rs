//! Source adapter error types.

use thiserror::Error;

pub type SourceResult<T> = Result<T, SourceError>;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Source unavailable: {0}")]
    Unavailable(String),

    #[error("Source credential rejected: {0}")]
    Unauthorized(String),

    #[error("No video posts found for channel {channel}")]
    EmptyPool { channel: String },

    #[error("Media download failed: {0}")]
    DownloadFailed(String),

    #[error("Invalid source response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SourceError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn download_failed(msg: impl Into<String>) -> Self {
        Self::DownloadFailed(msg.into())
    }

    pub fn empty_pool(channel: impl Into<String>) -> Self {
        Self::EmptyPool {
            channel: channel.into(),
        }
    }

    /// True when the channel returned no video content.
    pub fn is_empty_pool(&self) -> bool {
        matches!(self, SourceError::EmptyPool { .. })
    }
}
