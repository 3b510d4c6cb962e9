//! Model validation errors.

use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Content identifier must not be empty")]
    EmptyContentId,

    #[error("Unknown privacy status: {0}")]
    UnknownPrivacyStatus(String),
}
