//! Pipeline error types and the failure taxonomy.

use serde::Serialize;
use thiserror::Error;

use reel_genai::GenAiError;
use reel_ledger::LedgerError;
use reel_media::MediaError;
use reel_publish::PublishError;
use reel_source::SourceError;

use crate::report::RunStage;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Failure class of a run; each maps to a distinct exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ConfigMissing,
    SourceUnavailable,
    EmptyPool,
    NoEligibleCandidate,
    RenderFailed,
    AuthExpired,
    UploadFailed,
    TransientUnavailable,
}

impl FailureKind {
    pub fn exit_code(&self) -> i32 {
        match self {
            FailureKind::ConfigMissing => 2,
            FailureKind::SourceUnavailable => 3,
            FailureKind::EmptyPool => 4,
            FailureKind::NoEligibleCandidate => 5,
            FailureKind::RenderFailed => 6,
            FailureKind::AuthExpired => 7,
            FailureKind::UploadFailed => 8,
            FailureKind::TransientUnavailable => 9,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::ConfigMissing => "config_missing",
            FailureKind::SourceUnavailable => "source_unavailable",
            FailureKind::EmptyPool => "empty_pool",
            FailureKind::NoEligibleCandidate => "no_eligible_candidate",
            FailureKind::RenderFailed => "render_failed",
            FailureKind::AuthExpired => "auth_expired",
            FailureKind::UploadFailed => "upload_failed",
            FailureKind::TransientUnavailable => "transient_unavailable",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("init: missing required configuration {0}")]
    ConfigMissing(String),

    #[error("init: invalid configuration {var}: {reason}")]
    ConfigInvalid { var: String, reason: String },

    #[error("init: staging directory unusable: {0}")]
    Staging(#[source] MediaError),

    #[error("fetch: {0}")]
    Source(#[source] SourceError),

    #[error("select: no eligible candidate among {pool_size} in channel {channel}")]
    NoEligibleCandidate { channel: String, pool_size: usize },

    #[error("{stage}: ledger unavailable: {source}")]
    Ledger {
        stage: RunStage,
        #[source]
        source: LedgerError,
    },

    #[error("render: media download failed: {0}")]
    Download(#[source] SourceError),

    #[error("render: speech synthesis failed: {0}")]
    Speech(#[source] GenAiError),

    #[error("render: {0}")]
    Media(#[source] MediaError),

    #[error("publish: {0}")]
    Publish(#[source] PublishError),
}

impl PipelineError {
    pub fn config_invalid(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            var: var.into(),
            reason: reason.into(),
        }
    }

    pub fn ledger(stage: RunStage, source: LedgerError) -> Self {
        Self::Ledger { stage, source }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            PipelineError::ConfigMissing(_) | PipelineError::ConfigInvalid { .. } => {
                FailureKind::ConfigMissing
            }
            PipelineError::Source(e) if e.is_empty_pool() => FailureKind::EmptyPool,
            PipelineError::Source(_) | PipelineError::Download(_) => FailureKind::SourceUnavailable,
            PipelineError::NoEligibleCandidate { .. } => FailureKind::NoEligibleCandidate,
            PipelineError::Staging(_) | PipelineError::Speech(_) | PipelineError::Media(_) => {
                FailureKind::RenderFailed
            }
            PipelineError::Publish(e) if e.is_auth_expired() => FailureKind::AuthExpired,
            PipelineError::Publish(_) => FailureKind::UploadFailed,
            PipelineError::Ledger { .. } => FailureKind::TransientUnavailable,
        }
    }

    /// Stage in which the error arose.
    pub fn stage(&self) -> RunStage {
        match self {
            PipelineError::ConfigMissing(_)
            | PipelineError::ConfigInvalid { .. }
            | PipelineError::Staging(_) => RunStage::Init,
            PipelineError::Source(_) => RunStage::Fetch,
            PipelineError::NoEligibleCandidate { .. } => RunStage::Select,
            PipelineError::Ledger { stage, .. } => *stage,
            PipelineError::Download(_) | PipelineError::Speech(_) | PipelineError::Media(_) => {
                RunStage::Render
            }
            PipelineError::Publish(_) => RunStage::Publish,
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.kind().exit_code()
    }
}
