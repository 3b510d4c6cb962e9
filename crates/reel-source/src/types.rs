//! Feed wire types and conversion into candidates.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use reel_models::{Candidate, ContentId};

/// Which popularity counter ranks a post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PopularityMetric {
    /// Play/view count
    #[default]
    Views,
    /// Like count
    Likes,
}

impl fmt::Display for PopularityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PopularityMetric::Views => f.write_str("views"),
            PopularityMetric::Likes => f.write_str("likes"),
        }
    }
}

impl FromStr for PopularityMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "views" | "plays" => Ok(PopularityMetric::Views),
            "likes" => Ok(PopularityMetric::Likes),
            other => Err(format!("unknown popularity metric: {}", other)),
        }
    }
}

/// Feed response envelope.
///
/// Posts stay untyped here so one malformed record can be skipped instead
/// of failing the whole page.
#[derive(Debug, Deserialize)]
pub(crate) struct PostsResponse {
    #[serde(alias = "items", alias = "data")]
    pub posts: Vec<serde_json::Value>,
}

/// Post identifier as sent by the feed: numeric primary keys or strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PostId {
    Text(String),
    Number(u64),
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostId::Text(s) => f.write_str(s),
            PostId::Number(n) => write!(f, "{}", n),
        }
    }
}

/// One post as returned by the feed service.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostRecord {
    #[serde(default)]
    pub shortcode: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub id: Option<PostId>,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub is_video: Option<bool>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub play_count: Option<u64>,
    #[serde(default)]
    pub view_count: Option<u64>,
    #[serde(default)]
    pub like_count: Option<u64>,
}

impl PostRecord {
    /// Content identifier: `shortcode`, then `code`, then `id`.
    pub fn identifier(&self) -> Option<String> {
        [self.shortcode.clone(), self.code.clone(), self.id.as_ref().map(|id| id.to_string())]
            .into_iter()
            .flatten()
            .map(|s| s.trim().to_string())
            .find(|s| !s.is_empty())
    }

    /// Whether the post carries video content.
    pub fn is_video(&self) -> bool {
        if let Some(flag) = self.is_video {
            return flag;
        }
        matches!(
            self.media_type.as_deref().map(|t| t.to_lowercase()).as_deref(),
            Some("video") | Some("reel") | Some("clips")
        )
    }

    /// Popularity under the chosen metric; absent counters count as 0.
    pub fn popularity(&self, metric: PopularityMetric) -> u64 {
        match metric {
            PopularityMetric::Views => self.play_count.or(self.view_count).unwrap_or(0),
            PopularityMetric::Likes => self.like_count.unwrap_or(0),
        }
    }

    /// Convert to a candidate. Returns `None` for non-video posts and for
    /// posts missing an identifier or a media URL.
    pub fn into_candidate(self, metric: PopularityMetric) -> Option<Candidate> {
        if !self.is_video() {
            return None;
        }
        let popularity = self.popularity(metric);
        let id = ContentId::new(self.identifier()?).ok()?;
        let media_url = self.video_url.filter(|u| !u.trim().is_empty())?;
        let caption = self.caption.unwrap_or_default().trim().to_string();

        Some(Candidate::new(id, media_url, popularity).with_caption(caption))
    }
}
