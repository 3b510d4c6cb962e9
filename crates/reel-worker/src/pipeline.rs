//! Run orchestration.
//!
//! One run walks `Init -> Fetch -> Select -> Render -> Publish -> Commit ->
//! Done`. Any stage failure ends the run; there are no retries. The ledger
//! is written only after the publisher has accepted the upload.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{error, info, Instrument};
use uuid::Uuid;

use reel_genai::{ChatClient, GoogleTts};
use reel_ledger::{connect, PublicationLedger};
use reel_media::{reset_dir, FfmpegRenderer};
use reel_models::{CandidatePool, SelectionPolicy};
use reel_publish::{Publisher, YouTubePublisher};
use reel_source::{CandidateSource, FeedClient, SourceError};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::logging::RunLogger;
use crate::metrics;
use crate::report::{FailureRecord, RunReport, RunStage};
use crate::selector::Selector;
use crate::transform::TransformStage;

/// External collaborators of a run.
#[derive(Clone)]
pub struct Components {
    pub ledger: Arc<dyn PublicationLedger>,
    pub source: Arc<dyn CandidateSource>,
    pub transform: TransformStage,
    pub publisher: Arc<dyn Publisher>,
}

impl Components {
    /// Production implementations built from configuration.
    pub fn from_config(config: &PipelineConfig) -> PipelineResult<Self> {
        let ledger = connect(&config.ledger)
            .map_err(|e| PipelineError::config_invalid("LEDGER_URL", e.to_string()))?;
        let source = FeedClient::new(config.source.clone())
            .map_err(|e| PipelineError::config_invalid("SOURCE_API_URL", e.to_string()))?;
        let generator = ChatClient::new(config.generator.clone())
            .map_err(|e| PipelineError::config_invalid("GENERATOR_URL", e.to_string()))?;
        let speech = GoogleTts::new(config.tts.clone())
            .map_err(|e| PipelineError::config_invalid("TTS_URL", e.to_string()))?;
        let renderer = FfmpegRenderer::new(config.render.clone());
        let publisher = YouTubePublisher::new(config.credentials.clone(), config.youtube.clone())
            .map_err(|e| PipelineError::config_invalid("YT_CLIENT_SECRET", e.to_string()))?;

        Ok(Self {
            ledger: Arc::from(ledger),
            source: Arc::new(source),
            transform: TransformStage::new(
                Arc::new(generator),
                Arc::new(speech),
                Arc::new(renderer),
                config.tts_language.clone(),
            ),
            publisher: Arc::new(publisher),
        })
    }
}

/// Per-run settings that are not collaborators.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub channels: Vec<String>,
    pub policy: SelectionPolicy,
    pub staging_dir: PathBuf,
    pub dry_run: bool,
}

impl PipelineSettings {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            channels: config.channels.clone(),
            policy: config.policy,
            staging_dir: config.staging_dir.clone(),
            dry_run: config.dry_run,
        }
    }
}

/// Single-run pipeline.
pub struct Pipeline {
    components: Components,
    settings: PipelineSettings,
    selector: Selector,
}

impl Pipeline {
    pub fn new(components: Components, settings: PipelineSettings, selector: Selector) -> Self {
        Self {
            components,
            settings,
            selector,
        }
    }

    /// Pipeline wired to the production services.
    pub fn from_config(config: &PipelineConfig) -> PipelineResult<Self> {
        Ok(Self::new(
            Components::from_config(config)?,
            PipelineSettings::from_config(config),
            Selector::from_entropy(),
        ))
    }

    /// Execute one run. Failures are recorded in the report, never returned.
    pub async fn run(&mut self) -> RunReport {
        let run_id = Uuid::new_v4().to_string();
        let logger = RunLogger::new(&run_id);
        let mut report = RunReport::new(&run_id, self.settings.dry_run);

        let span = logger.create_span();
        let result = self.execute(&mut report, &logger).instrument(span).await;

        report.finished_at = Some(Utc::now());
        match result {
            Ok(()) => {
                metrics::record_run("success");
                info!(
                    run_id = %run_id,
                    selected = ?report.selected.as_ref().map(|id| id.as_str()),
                    published = ?report.published.as_ref().map(|id| id.as_str()),
                    dry_run = report.dry_run,
                    "Run completed"
                );
            }
            Err(e) => {
                let kind = e.kind();
                metrics::record_run(kind.as_str());
                error!(
                    run_id = %run_id,
                    kind = %kind,
                    stage = %e.stage(),
                    exit_code = kind.exit_code(),
                    error = %e,
                    "Run failed"
                );
                report.failure = Some(FailureRecord {
                    kind,
                    stage: e.stage(),
                    message: e.to_string(),
                });
            }
        }
        report
    }

    async fn execute(&mut self, report: &mut RunReport, logger: &RunLogger) -> PipelineResult<()> {
        // Init
        let log = logger.at(RunStage::Init);
        log.log_start("resetting staging directory");
        let started = Instant::now();
        let channel = close_stage(report, &log, started, self.prepare().await)?;
        report.channel = Some(channel.clone());

        // Fetch
        let log = logger.at(RunStage::Fetch);
        log.log_start(&format!("fetching pool for {}", channel));
        let started = Instant::now();
        let pool = close_stage(report, &log, started, self.fetch(&channel).await)?;
        report.pool_size = Some(pool.len());

        // Select
        let log = logger.at(RunStage::Select);
        log.log_start(&format!("{} candidates", pool.len()));
        let started = Instant::now();
        let selected = self
            .selector
            .select(&pool, self.components.ledger.as_ref(), &self.settings.policy)
            .await;
        let candidate = close_stage(report, &log, started, selected)?;
        log.log_progress(&format!(
            "selected {} (popularity {})",
            candidate.id, candidate.popularity
        ));
        report.selected = Some(candidate.id.clone());

        // Render
        let log = logger.at(RunStage::Render);
        log.log_start(&format!("transforming {}", candidate.id));
        let started = Instant::now();
        let transformed = self
            .components
            .transform
            .run(
                self.components.source.as_ref(),
                &candidate,
                &self.settings.staging_dir,
            )
            .await;
        let output = close_stage(report, &log, started, transformed)?;
        report.used_fallback_script = Some(output.script.is_fallback);
        report.source_duration_seconds = Some(output.source_duration);
        report.artifact = Some(output.artifact.path.clone());
        report.duration_seconds = Some(output.artifact.duration_seconds);

        if self.settings.dry_run {
            logger.at(RunStage::Publish).log_warning(&format!(
                "dry run, artifact left at {}; publish and commit skipped",
                output.artifact.path.display()
            ));
            return Ok(());
        }

        // Publish
        let log = logger.at(RunStage::Publish);
        log.log_start(&format!("uploading {}", output.artifact.path.display()));
        let started = Instant::now();
        let metadata = self.components.transform.metadata(&candidate.caption).await;
        let published = self
            .components
            .publisher
            .publish(&output.artifact, &metadata)
            .await
            .map_err(PipelineError::Publish);
        let published_id = close_stage(report, &log, started, published)?;
        log.log_progress(&format!("published as {}", published_id.watch_url()));
        report.published = Some(published_id.clone());

        // Commit
        let log = logger.at(RunStage::Commit);
        log.log_start(&format!("recording {}", candidate.id));
        let started = Instant::now();
        let committed = self
            .components
            .ledger
            .add(&candidate.id)
            .await
            .map_err(|e| PipelineError::ledger(RunStage::Commit, e));
        if committed.is_err() {
            error!(
                run_id = %logger.run_id(),
                content_id = %candidate.id,
                published_id = %published_id,
                "Published but not recorded in the ledger; add the content id manually"
            );
        }
        close_stage(report, &log, started, committed)?;
        report.committed = true;

        Ok(())
    }

    async fn prepare(&mut self) -> PipelineResult<String> {
        reset_dir(&self.settings.staging_dir)
            .await
            .map_err(PipelineError::Staging)?;

        self.selector
            .choose_channel(&self.settings.channels)
            .map(str::to_string)
            .ok_or_else(|| PipelineError::ConfigMissing("SOURCE_CHANNELS".to_string()))
    }

    async fn fetch(&self, channel: &str) -> PipelineResult<CandidatePool> {
        let pool = self
            .components
            .source
            .fetch(channel)
            .await
            .map_err(PipelineError::Source)?;
        if pool.is_empty() {
            return Err(PipelineError::Source(SourceError::empty_pool(channel)));
        }
        Ok(pool)
    }
}

/// Record timing and outcome of a stage, passing the result through.
fn close_stage<T>(
    report: &mut RunReport,
    log: &RunLogger,
    started: Instant,
    result: PipelineResult<T>,
) -> PipelineResult<T> {
    let elapsed_ms = started.elapsed().as_millis() as u64;
    report.record_stage(log.stage(), result.is_ok(), elapsed_ms);
    metrics::record_stage(log.stage(), elapsed_ms);
    match &result {
        Ok(_) => log.log_completion(elapsed_ms),
        Err(e) => log.log_error(&e.to_string()),
    }
    result
}
