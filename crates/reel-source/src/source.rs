//! Candidate source trait.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use reel_models::{Candidate, CandidatePool};

use crate::error::SourceResult;

/// Supplies candidate content for a channel.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    /// Fetch the channel's pool of video candidates.
    ///
    /// Non-video posts are dropped silently. Fails with `EmptyPool` when no
    /// video remains, and with `Unavailable`/`Network` on transport or auth
    /// errors.
    async fn fetch(&self, channel: &str) -> SourceResult<CandidatePool>;

    /// Download the candidate's media into `dir`, returning the file path.
    async fn download(&self, candidate: &Candidate, dir: &Path) -> SourceResult<PathBuf>;
}
