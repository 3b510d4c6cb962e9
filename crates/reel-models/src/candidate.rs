//! Candidate content models.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ModelError, ModelResult};

/// Opaque, source-unique identifier of a content item (e.g. a short-code).
///
/// This is the key recorded in the publication ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentId(String);

impl ContentId {
    /// Create an identifier, rejecting empty or whitespace-only input.
    pub fn new(s: impl Into<String>) -> ModelResult<Self> {
        let s = s.into();
        if s.trim().is_empty() {
            return Err(ModelError::EmptyContentId);
        }
        Ok(Self(s))
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ContentId {
    type Error = ModelError;

    fn try_from(s: String) -> ModelResult<Self> {
        Self::new(s)
    }
}

impl TryFrom<&str> for ContentId {
    type Error = ModelError;

    fn try_from(s: &str) -> ModelResult<Self> {
        Self::new(s)
    }
}

impl From<ContentId> for String {
    fn from(id: ContentId) -> Self {
        id.0
    }
}

impl AsRef<str> for ContentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One fetched content item that may be selected in a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: ContentId,
    /// Direct URL of the video file
    pub media_url: String,
    /// Original caption text (possibly empty)
    #[serde(default)]
    pub caption: String,
    /// Popularity metric; missing counters are recorded as 0
    #[serde(default)]
    pub popularity: u64,
}

impl Candidate {
    pub fn new(id: ContentId, media_url: impl Into<String>, popularity: u64) -> Self {
        Self {
            id,
            media_url: media_url.into(),
            caption: String::new(),
            popularity,
        }
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = caption.into();
        self
    }
}

/// Candidates fetched from one channel for a single run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidatePool {
    pub channel: String,
    pub candidates: Vec<Candidate>,
}

impl CandidatePool {
    pub fn new(channel: impl Into<String>, candidates: Vec<Candidate>) -> Self {
        Self {
            channel: channel.into(),
            candidates,
        }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Eligibility policy applied by the selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionPolicy {
    /// Minimum popularity (inclusive)
    pub min_popularity: u64,
}

impl SelectionPolicy {
    pub fn new(min_popularity: u64) -> Self {
        Self { min_popularity }
    }

    /// Whether the candidate passes the popularity threshold.
    pub fn meets_threshold(&self, candidate: &Candidate) -> bool {
        candidate.popularity >= self.min_popularity
    }
}
