//! Render and publish outputs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Rendered output file produced by the transform stage.
///
/// Consumed exactly once by the publisher; the staging directory holding it
/// is reset at the start of the next run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedArtifact {
    pub path: PathBuf,
    /// Probed duration in seconds, always > 0
    pub duration_seconds: f64,
}

impl RenderedArtifact {
    pub fn new(path: impl Into<PathBuf>, duration_seconds: f64) -> Self {
        Self {
            path: path.into(),
            duration_seconds,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Identifier assigned by the destination platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublishedId(pub String);

impl PublishedId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Public watch URL for the published video.
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl fmt::Display for PublishedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PublishedId {
    fn from(s: String) -> Self {
        Self(s)
    }
}
