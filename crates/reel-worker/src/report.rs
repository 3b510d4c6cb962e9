//! Run stages and the per-run report.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use reel_models::{ContentId, PublishedId};

use crate::error::FailureKind;

/// Pipeline stage. Runs move strictly forward; a failure in any stage ends
/// the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStage {
    Init,
    Fetch,
    Select,
    Render,
    Publish,
    Commit,
    Done,
}

impl RunStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStage::Init => "init",
            RunStage::Fetch => "fetch",
            RunStage::Select => "select",
            RunStage::Render => "render",
            RunStage::Publish => "publish",
            RunStage::Commit => "commit",
            RunStage::Done => "done",
        }
    }
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One completed or failed stage.
#[derive(Debug, Clone, Serialize)]
pub struct StageRecord {
    pub stage: RunStage,
    pub ok: bool,
    pub elapsed_ms: u64,
}

/// Why a run ended early.
#[derive(Debug, Clone, Serialize)]
pub struct FailureRecord {
    pub kind: FailureKind,
    pub stage: RunStage,
    pub message: String,
}

/// Summary of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub dry_run: bool,
    pub channel: Option<String>,
    pub pool_size: Option<usize>,
    pub selected: Option<ContentId>,
    pub used_fallback_script: Option<bool>,
    /// Duration of the downloaded source media
    pub source_duration_seconds: Option<f64>,
    pub artifact: Option<PathBuf>,
    pub duration_seconds: Option<f64>,
    pub published: Option<PublishedId>,
    pub committed: bool,
    pub stages: Vec<StageRecord>,
    pub failure: Option<FailureRecord>,
}

impl RunReport {
    pub fn new(run_id: impl Into<String>, dry_run: bool) -> Self {
        Self {
            run_id: run_id.into(),
            started_at: Utc::now(),
            finished_at: None,
            dry_run,
            channel: None,
            pool_size: None,
            selected: None,
            used_fallback_script: None,
            source_duration_seconds: None,
            artifact: None,
            duration_seconds: None,
            published: None,
            committed: false,
            stages: Vec::new(),
            failure: None,
        }
    }

    pub fn record_stage(&mut self, stage: RunStage, ok: bool, elapsed_ms: u64) {
        self.stages.push(StageRecord {
            stage,
            ok,
            elapsed_ms,
        });
    }

    /// Last stage reached: `Done` on success, the failing stage otherwise.
    pub fn final_stage(&self) -> RunStage {
        match &self.failure {
            Some(failure) => failure.stage,
            None if self.finished_at.is_some() => RunStage::Done,
            None => self.stages.last().map(|s| s.stage).unwrap_or(RunStage::Init),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.failure.is_none() && self.finished_at.is_some()
    }

    /// Process exit code for this run.
    pub fn exit_code(&self) -> i32 {
        self.failure.as_ref().map(|f| f.kind.exit_code()).unwrap_or(0)
    }

    /// Stages visited in order, for assertions and logs.
    pub fn stage_path(&self) -> Vec<RunStage> {
        self.stages.iter().map(|s| s.stage).collect()
    }
}
