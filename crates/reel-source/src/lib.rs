//! Candidate source adapter.
//!
//! This crate provides:
//! - The `CandidateSource` trait (fetch a channel's pool, download media)
//! - `FeedClient`, an HTTP client for the post feed service
//! - Video-only filtering and popularity extraction from post records

pub mod download;
pub mod error;
pub mod feed;
pub mod source;
pub mod types;

pub use error::{SourceError, SourceResult};
pub use feed::{FeedClient, FeedConfig};
pub use source::CandidateSource;
pub use types::{PopularityMetric, PostId, PostRecord};
