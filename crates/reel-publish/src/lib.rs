//! Publishing rendered shorts to YouTube.
//!
//! This crate provides:
//! - OAuth client secret / authorized-user token parsing
//! - An access token cache driven by the refresh token
//! - The `Publisher` trait and a resumable-upload implementation

pub mod credentials;
pub mod error;
pub mod token_cache;
pub mod youtube;

pub use credentials::{read_inline_or_file, OAuthCredentials, DEFAULT_TOKEN_URI};
pub use error::{PublishError, PublishResult};
pub use token_cache::TokenCache;
pub use youtube::{Publisher, YouTubeConfig, YouTubePublisher, DEFAULT_CATEGORY_ID, DEFAULT_UPLOAD_URL};
