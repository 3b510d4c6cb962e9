//! Generated narration and publish metadata.
//!
//! Both are produced by the text generator and both degrade to a fixed
//! fallback instead of failing the run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;
use crate::utils::truncate_chars;

/// Maximum hook length in characters.
pub const MAX_HOOK_CHARS: usize = 50;
/// Maximum narration length in characters.
pub const MAX_NARRATION_CHARS: usize = 120;

/// Maximum title length in characters.
pub const MAX_TITLE_CHARS: usize = 60;
/// Maximum description length in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 200;
/// Maximum number of tags.
pub const MAX_TAGS: usize = 10;

pub const FALLBACK_HOOK: &str = "Check this out";
pub const FALLBACK_NARRATION: &str = "This clip surprised everyone watching.";

pub const DEFAULT_TITLE: &str = "Viral Video #shorts";
pub const DEFAULT_DESCRIPTION: &str = "Watch till the end! #shorts";
pub const DEFAULT_TAGS: &[&str] = &["shorts", "viral"];

/// Hook (on-screen text) and narration (spoken text) for one clip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrationScript {
    pub hook: String,
    pub narration: String,
    /// True when the fixed fallback pair was substituted
    #[serde(default)]
    pub is_fallback: bool,
}

impl NarrationScript {
    /// Build a script from generated text, trimming and enforcing length limits.
    pub fn new(hook: &str, narration: &str) -> Self {
        Self {
            hook: truncate_chars(hook.trim(), MAX_HOOK_CHARS),
            narration: truncate_chars(narration.trim(), MAX_NARRATION_CHARS),
            is_fallback: false,
        }
    }

    /// The fixed fallback pair.
    pub fn fallback() -> Self {
        Self {
            hook: FALLBACK_HOOK.to_string(),
            narration: FALLBACK_NARRATION.to_string(),
            is_fallback: true,
        }
    }
}

/// Title, description and tags sent to the destination platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishMetadata {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_fallback: bool,
}

impl PublishMetadata {
    /// Build metadata, enforcing length limits and de-duplicating tags.
    pub fn new<I, S>(title: &str, description: &str, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut unique: Vec<String> = Vec::new();
        for tag in tags {
            let tag = tag.as_ref().trim();
            if tag.is_empty() || unique.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
                continue;
            }
            unique.push(tag.to_string());
            if unique.len() == MAX_TAGS {
                break;
            }
        }

        Self {
            title: truncate_chars(title.trim(), MAX_TITLE_CHARS),
            description: truncate_chars(description.trim(), MAX_DESCRIPTION_CHARS),
            tags: unique,
            is_fallback: false,
        }
    }

    /// The fixed default tuple.
    pub fn fallback() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            tags: DEFAULT_TAGS.iter().map(|t| t.to_string()).collect(),
            is_fallback: true,
        }
    }
}

/// Visibility of a published video.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyStatus {
    #[default]
    Public,
    Unlisted,
    Private,
}

impl PrivacyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrivacyStatus::Public => "public",
            PrivacyStatus::Unlisted => "unlisted",
            PrivacyStatus::Private => "private",
        }
    }
}

impl fmt::Display for PrivacyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrivacyStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "public" => Ok(PrivacyStatus::Public),
            "unlisted" => Ok(PrivacyStatus::Unlisted),
            "private" => Ok(PrivacyStatus::Private),
            other => Err(ModelError::UnknownPrivacyStatus(other.to_string())),
        }
    }
}
