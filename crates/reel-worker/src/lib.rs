//! Single-run reel pipeline.
//!
//! This crate provides:
//! - Environment-driven configuration
//! - Random-eligible candidate selection against the publication ledger
//! - The transform stage (download, narrate, render)
//! - The run orchestrator and its report
//! - Failure taxonomy with per-kind exit codes

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod report;
pub mod selector;
pub mod transform;

pub use config::PipelineConfig;
pub use error::{FailureKind, PipelineError, PipelineResult};
pub use logging::RunLogger;
pub use pipeline::{Components, Pipeline, PipelineSettings};
pub use report::{RunReport, RunStage};
pub use selector::Selector;
pub use transform::{TransformOutput, TransformStage};
