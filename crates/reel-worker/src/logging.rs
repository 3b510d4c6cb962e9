//! Structured run logging.
//!
//! Every line emitted through [`RunLogger`] carries the run id and the
//! current stage so a single run can be followed through aggregated logs.

use tracing::{error, info, warn, Span};

use crate::report::RunStage;

/// Logger bound to one run and its current stage.
#[derive(Debug, Clone)]
pub struct RunLogger {
    run_id: String,
    stage: RunStage,
}

impl RunLogger {
    pub fn new(run_id: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            stage: RunStage::Init,
        }
    }

    /// Logger for the same run at another stage.
    pub fn at(&self, stage: RunStage) -> Self {
        Self {
            run_id: self.run_id.clone(),
            stage,
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            stage = %self.stage,
            "Stage started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            stage = %self.stage,
            "{}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            run_id = %self.run_id,
            stage = %self.stage,
            "Stage warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            run_id = %self.run_id,
            stage = %self.stage,
            "Stage failed: {}", message
        );
    }

    pub fn log_completion(&self, elapsed_ms: u64) {
        info!(
            run_id = %self.run_id,
            stage = %self.stage,
            elapsed_ms,
            "Stage completed"
        );
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn stage(&self) -> RunStage {
        self.stage
    }

    /// Span covering the whole run.
    pub fn create_span(&self) -> Span {
        tracing::info_span!("run", run_id = %self.run_id)
    }
}
