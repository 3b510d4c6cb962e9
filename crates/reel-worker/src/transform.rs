//! Transform stage: source media to narrated artifact.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use reel_genai::{generate_metadata, generate_script, SpeechSynthesizer, TextGenerator};
use reel_media::{RenderRequest, VideoRenderer};
use reel_models::{Candidate, NarrationScript, PublishMetadata, RenderedArtifact};
use reel_source::CandidateSource;

use crate::error::{PipelineError, PipelineResult};

/// Narration audio file name inside the staging directory.
pub const NARRATION_FILE: &str = "voice.mp3";

/// Rendered output file name inside the staging directory.
pub const OUTPUT_FILE: &str = "final_short.mp4";

/// Result of a successful transform.
#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub artifact: RenderedArtifact,
    pub script: NarrationScript,
    /// Duration of the downloaded source, in seconds
    pub source_duration: f64,
}

/// Downloads, narrates and renders one candidate.
#[derive(Clone)]
pub struct TransformStage {
    generator: Arc<dyn TextGenerator>,
    speech: Arc<dyn SpeechSynthesizer>,
    renderer: Arc<dyn VideoRenderer>,
    language: String,
}

impl TransformStage {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        speech: Arc<dyn SpeechSynthesizer>,
        renderer: Arc<dyn VideoRenderer>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            generator,
            speech,
            renderer,
            language: language.into(),
        }
    }

    /// Produce the rendered artifact for a candidate.
    ///
    /// All files are written under `staging`. Script generation degrades to
    /// the fixed fallback; every other step is fatal.
    pub async fn run(
        &self,
        source: &dyn CandidateSource,
        candidate: &Candidate,
        staging: &Path,
    ) -> PipelineResult<TransformOutput> {
        let video = source
            .download(candidate, staging)
            .await
            .map_err(PipelineError::Download)?;

        let source_duration = self
            .renderer
            .probe_duration(&video)
            .await
            .map_err(PipelineError::Media)?;
        info!(
            id = %candidate.id,
            path = %video.display(),
            source_duration,
            "Source media downloaded"
        );

        let script = generate_script(self.generator.as_ref(), &candidate.caption).await;
        if script.is_fallback {
            warn!(id = %candidate.id, "Using fallback narration script");
        }
        info!(hook = %script.hook, narration = %script.narration, "Narration script ready");

        let narration_audio = self
            .speech
            .synthesize(&script.narration, &self.language, &staging.join(NARRATION_FILE))
            .await
            .map_err(PipelineError::Speech)?;

        let request = RenderRequest {
            video,
            narration_audio,
            hook: script.hook.clone(),
            output: output_path(staging),
        };
        let artifact = self
            .renderer
            .render(&request)
            .await
            .map_err(PipelineError::Media)?;

        Ok(TransformOutput {
            artifact,
            script,
            source_duration,
        })
    }

    /// Title, description and tags for the candidate. Never fails.
    pub async fn metadata(&self, caption: &str) -> PublishMetadata {
        let metadata = generate_metadata(self.generator.as_ref(), caption).await;
        if metadata.is_fallback {
            warn!("Using fallback publish metadata");
        }
        metadata
    }
}

pub fn output_path(staging: &Path) -> PathBuf {
    staging.join(OUTPUT_FILE)
}
