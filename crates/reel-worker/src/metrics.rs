//! Run metrics.

use metrics::{counter, histogram};

use crate::report::RunStage;

pub mod names {
    /// Completed runs by outcome (`success` or a failure kind).
    pub const RUNS_TOTAL: &str = "reelcast_runs_total";

    /// Stage wall time in seconds by stage.
    pub const STAGE_SECONDS: &str = "reelcast_stage_seconds";
}

pub fn record_run(outcome: &'static str) {
    counter!(names::RUNS_TOTAL, "outcome" => outcome).increment(1);
}

pub fn record_stage(stage: RunStage, elapsed_ms: u64) {
    histogram!(names::STAGE_SECONDS, "stage" => stage.as_str()).record(elapsed_ms as f64 / 1000.0);
}
