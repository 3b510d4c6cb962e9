//! Shared data models for the reelcast pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Content identifiers and fetched candidates
//! - Selection policy
//! - Narration scripts and publish metadata (with their fallbacks)
//! - Rendered artifacts and published identifiers
//! - Encoding configuration

pub mod artifact;
pub mod candidate;
pub mod encoding;
pub mod error;
pub mod script;
pub mod utils;

// Re-export common types
pub use artifact::{PublishedId, RenderedArtifact};
pub use candidate::{Candidate, CandidatePool, ContentId, SelectionPolicy};
pub use encoding::EncodingConfig;
pub use error::{ModelError, ModelResult};
pub use script::{NarrationScript, PrivacyStatus, PublishMetadata};
pub use utils::truncate_chars;
