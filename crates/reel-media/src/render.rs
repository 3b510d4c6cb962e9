//! Narration mix and watermark rendering.
//!
//! One ffmpeg pass takes the source video (input 0) and the narration
//! audio (input 1):
//!
//! - audio: original track attenuated, narration boosted, mixed with the
//!   duration of the original
//! - video: optional hook caption and optional corner watermark, both via
//!   `drawtext`
//!
//! The result is written under a temporary name and moved into place once
//! ffmpeg succeeds, so the final path only ever holds a complete render.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use reel_models::{EncodingConfig, RenderedArtifact};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::fs_utils::{move_file, remove_if_exists};
use crate::probe::probe_duration;
use crate::process::{CommandRunner, SystemRunner};

pub const DEFAULT_ORIGINAL_VOLUME: f64 = 0.3;
pub const DEFAULT_NARRATION_VOLUME: f64 = 2.0;
pub const DEFAULT_WATERMARK_TEXT: &str = "🍫";
pub const DEFAULT_WATERMARK_FONT: &str = "/usr/share/fonts/truetype/noto/NotoColorEmoji.ttf";

/// Rendering parameters.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Gain applied to the source audio track
    pub original_volume: f64,
    /// Gain applied to the narration track
    pub narration_volume: f64,
    /// Corner watermark text; `None` disables the watermark
    pub watermark_text: Option<String>,
    /// Font file used for the watermark
    pub watermark_font: Option<String>,
    /// Burn the hook into the lower third of the frame
    pub overlay_hook: bool,
    pub encoding: EncodingConfig,
    /// Hard limit on the ffmpeg run
    pub timeout: Duration,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            original_volume: DEFAULT_ORIGINAL_VOLUME,
            narration_volume: DEFAULT_NARRATION_VOLUME,
            watermark_text: Some(DEFAULT_WATERMARK_TEXT.to_string()),
            watermark_font: Some(DEFAULT_WATERMARK_FONT.to_string()),
            overlay_hook: false,
            encoding: EncodingConfig::default(),
            timeout: Duration::from_secs(600),
        }
    }
}

/// Inputs for one render.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub video: PathBuf,
    pub narration_audio: PathBuf,
    pub hook: String,
    pub output: PathBuf,
}

/// Produces the final artifact from a source video and narration audio.
#[async_trait]
pub trait VideoRenderer: Send + Sync {
    async fn render(&self, request: &RenderRequest) -> MediaResult<RenderedArtifact>;

    /// Container duration of an existing media file, in seconds.
    async fn probe_duration(&self, path: &Path) -> MediaResult<f64>;
}

/// Escape a path used as a filter option value.
fn escape_filter_path(path: &str) -> String {
    path.replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace(':', "\\:")
}

/// Escape text placed inside single quotes in a `drawtext` filter.
///
/// A straight apostrophe cannot appear inside a quoted filter value, so it
/// is replaced with a typographic one.
pub fn escape_drawtext(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push('\u{2019}'),
            ':' => out.push_str("\\:"),
            '%' => out.push_str("\\%"),
            '\n' | '\r' => out.push(' '),
            _ => out.push(c),
        }
    }
    out
}

/// Build the `-filter_complex` graph. Outputs are labeled `[outv]` and `[outa]`.
pub fn build_filter_graph(config: &RenderConfig, hook: &str) -> String {
    let audio = format!(
        "[0:a]volume={}[a_orig];[1:a]volume={}[a_voice];[a_orig][a_voice]amix=inputs=2:duration=first[outa]",
        config.original_volume, config.narration_volume
    );

    let mut video_filters: Vec<String> = Vec::new();

    if config.overlay_hook && !hook.trim().is_empty() {
        video_filters.push(format!(
            "drawtext=text='{}':fontcolor=white:fontsize=30:box=1:boxcolor=black@0.6:x=(w-tw)/2:y=h-th-150",
            escape_drawtext(hook.trim())
        ));
    }

    if let Some(text) = config.watermark_text.as_deref().filter(|t| !t.is_empty()) {
        let font = config
            .watermark_font
            .as_deref()
            .map(|f| format!(":fontfile='{}'", escape_filter_path(f)))
            .unwrap_or_default();
        video_filters.push(format!(
            "drawtext=text='{}'{}:fontsize=38:fontcolor=white@0.55:x=w-tw-30:y=h-th-30",
            escape_drawtext(text),
            font
        ));
    }

    let video = if video_filters.is_empty() {
        "[0:v]null[outv]".to_string()
    } else {
        format!("[0:v]{}[outv]", video_filters.join(","))
    };

    format!("{};{}", audio, video)
}

/// Renderer that shells out to ffmpeg and ffprobe.
pub struct FfmpegRenderer {
    runner: Arc<dyn CommandRunner>,
    config: RenderConfig,
}

impl FfmpegRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self::with_runner(Arc::new(SystemRunner), config)
    }

    pub fn with_runner(runner: Arc<dyn CommandRunner>, config: RenderConfig) -> Self {
        Self { runner, config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    fn build_command(&self, request: &RenderRequest, partial: &Path) -> FfmpegCommand {
        FfmpegCommand::new(partial)
            .input(&request.video)
            .input(&request.narration_audio)
            .filter_complex(build_filter_graph(&self.config, &request.hook))
            .map("[outv]")
            .map("[outa]")
            .output_args(self.config.encoding.to_ffmpeg_args())
            .output_args(["-movflags", "+faststart"])
    }
}

/// Sibling path used while ffmpeg is writing.
fn partial_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "render".to_string());
    output.with_file_name(format!("{}.partial.mp4", stem))
}

#[async_trait]
impl VideoRenderer for FfmpegRenderer {
    async fn render(&self, request: &RenderRequest) -> MediaResult<RenderedArtifact> {
        for input in [&request.video, &request.narration_audio] {
            if !input.exists() {
                return Err(MediaError::FileNotFound(input.clone()));
            }
        }

        let partial = partial_path(&request.output);
        remove_if_exists(&partial).await?;
        remove_if_exists(&request.output).await?;

        info!(
            video = %request.video.display(),
            output = %request.output.display(),
            overlay_hook = self.config.overlay_hook,
            "Rendering narrated video"
        );

        let cmd = self.build_command(request, &partial);
        let ffmpeg = FfmpegRunner::new(Arc::clone(&self.runner)).with_timeout(self.config.timeout);

        if let Err(e) = ffmpeg.run(&cmd).await {
            warn!(error = %e, stderr = ?e.stderr_tail(5), "FFmpeg render failed");
            let _ = remove_if_exists(&partial).await;
            return Err(e);
        }

        let size = match tokio::fs::metadata(&partial).await {
            Ok(meta) => meta.len(),
            Err(_) => {
                return Err(MediaError::invalid_output(format!(
                    "ffmpeg produced no file at {}",
                    partial.display()
                )))
            }
        };
        if size == 0 {
            let _ = remove_if_exists(&partial).await;
            return Err(MediaError::invalid_output("ffmpeg produced an empty file"));
        }

        move_file(&partial, &request.output).await?;

        let duration_seconds = probe_duration(self.runner.as_ref(), &request.output).await?;
        info!(
            output = %request.output.display(),
            bytes = size,
            duration_seconds,
            "Render complete"
        );

        Ok(RenderedArtifact::new(request.output.clone(), duration_seconds))
    }

    async fn probe_duration(&self, path: &Path) -> MediaResult<f64> {
        probe_duration(self.runner.as_ref(), path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ProcessOutput;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Fake ffmpeg/ffprobe: ffmpeg writes `bytes` to the last argument.
    struct FakeTools {
        ffmpeg_exit: i32,
        bytes: &'static [u8],
        duration: &'static str,
        calls: Mutex<Vec<(String, Vec<String>)>>,
    }

    impl FakeTools {
        fn ok() -> Self {
            Self {
                ffmpeg_exit: 0,
                bytes: b"mp4data",
                duration: "14.2\n",
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CommandRunner for FakeTools {
        async fn run(
            &self,
            program: &str,
            args: &[String],
            _timeout: Option<Duration>,
        ) -> MediaResult<ProcessOutput> {
            self.calls
                .lock()
                .unwrap()
                .push((program.to_string(), args.to_vec()));
            match program {
                "ffmpeg" => {
                    if self.ffmpeg_exit == 0 {
                        let out = args.last().unwrap();
                        std::fs::write(out, self.bytes).unwrap();
                    }
                    Ok(ProcessOutput {
                        code: Some(self.ffmpeg_exit),
                        stdout: String::new(),
                        stderr: "Stream map '0:a' matches no streams".to_string(),
                    })
                }
                _ => Ok(ProcessOutput {
                    code: Some(0),
                    stdout: self.duration.to_string(),
                    stderr: String::new(),
                }),
            }
        }
    }

    fn request(dir: &TempDir) -> RenderRequest {
        let video = dir.path().join("reel.mp4");
        let voice = dir.path().join("voice.mp3");
        std::fs::write(&video, b"v").unwrap();
        std::fs::write(&voice, b"a").unwrap();
        RenderRequest {
            video,
            narration_audio: voice,
            hook: "Wait for it".to_string(),
            output: dir.path().join("final_short.mp4"),
        }
    }

    #[test]
    fn test_default_filter_graph() {
        let graph = build_filter_graph(&RenderConfig::default(), "ignored");
        assert_eq!(
            graph,
            "[0:a]volume=0.3[a_orig];[1:a]volume=2[a_voice];[a_orig][a_voice]amix=inputs=2:duration=first[outa];\
             [0:v]drawtext=text='🍫':fontfile='/usr/share/fonts/truetype/noto/NotoColorEmoji.ttf':fontsize=38:fontcolor=white@0.55:x=w-tw-30:y=h-th-30[outv]"
        );
    }

    #[test]
    fn test_filter_graph_with_hook_and_no_watermark() {
        let config = RenderConfig {
            overlay_hook: true,
            watermark_text: None,
            ..Default::default()
        };
        let graph = build_filter_graph(&config, "Don't: 100%");
        assert!(graph.contains("drawtext=text='Don\u{2019}t\\: 100\\%':fontcolor=white"));
        assert!(graph.ends_with("y=h-th-150[outv]"));
    }

    #[test]
    fn test_filter_graph_without_video_filters() {
        let config = RenderConfig {
            watermark_text: None,
            ..Default::default()
        };
        assert!(build_filter_graph(&config, "hook").ends_with(";[0:v]null[outv]"));
    }

    #[test]
    fn test_partial_path() {
        assert_eq!(
            partial_path(Path::new("/s/final_short.mp4")),
            PathBuf::from("/s/final_short.partial.mp4")
        );
    }

    #[tokio::test]
    async fn test_render_success() {
        let dir = TempDir::new().unwrap();
        let tools = Arc::new(FakeTools::ok());
        let renderer = FfmpegRenderer::with_runner(tools.clone(), RenderConfig::default());

        let req = request(&dir);
        let artifact = renderer.render(&req).await.unwrap();

        assert_eq!(artifact.path(), req.output.as_path());
        assert!((artifact.duration_seconds - 14.2).abs() < 1e-9);
        assert!(req.output.exists());
        assert!(!partial_path(&req.output).exists());

        let calls = tools.calls.lock().unwrap();
        assert_eq!(calls[0].0, "ffmpeg");
        let args = &calls[0].1;
        assert!(args.windows(2).any(|w| w == ["-c:v", "libx264"]));
        assert!(args.windows(2).any(|w| w == ["-preset", "ultrafast"]));
        assert!(args.windows(2).any(|w| w == ["-map", "[outa]"]));
        assert_eq!(calls[1].0, "ffprobe");
    }

    #[tokio::test]
    async fn test_render_nonzero_exit() {
        let dir = TempDir::new().unwrap();
        let tools = Arc::new(FakeTools {
            ffmpeg_exit: 1,
            ..FakeTools::ok()
        });
        let renderer = FfmpegRenderer::with_runner(tools, RenderConfig::default());

        let req = request(&dir);
        let err = renderer.render(&req).await.unwrap_err();
        assert!(matches!(err, MediaError::FfmpegFailed { exit_code: Some(1), .. }));
        assert!(!req.output.exists());
    }

    #[tokio::test]
    async fn test_render_empty_output() {
        let dir = TempDir::new().unwrap();
        let tools = Arc::new(FakeTools {
            bytes: b"",
            ..FakeTools::ok()
        });
        let renderer = FfmpegRenderer::with_runner(tools, RenderConfig::default());

        let err = renderer.render(&request(&dir)).await.unwrap_err();
        assert!(matches!(err, MediaError::InvalidOutput(_)));
    }

    #[tokio::test]
    async fn test_render_zero_duration() {
        let dir = TempDir::new().unwrap();
        let tools = Arc::new(FakeTools {
            duration: "0.0",
            ..FakeTools::ok()
        });
        let renderer = FfmpegRenderer::with_runner(tools, RenderConfig::default());

        let err = renderer.render(&request(&dir)).await.unwrap_err();
        assert!(matches!(err, MediaError::InvalidOutput(_)));
    }

    #[tokio::test]
    async fn test_render_missing_audio() {
        let dir = TempDir::new().unwrap();
        let mut req = request(&dir);
        req.narration_audio = dir.path().join("missing.mp3");
        let renderer = FfmpegRenderer::with_runner(Arc::new(FakeTools::ok()), RenderConfig::default());

        let err = renderer.render(&req).await.unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }

    #[tokio::test]
    #[ignore = "requires ffmpeg and ffprobe"]
    async fn test_render_with_real_ffmpeg() {
        let dir = TempDir::new().unwrap();
        let video = dir.path().join("src.mp4");
        let voice = dir.path().join("voice.mp3");
        let gen = |args: &[&str]| {
            std::process::Command::new("ffmpeg")
                .args(args)
                .status()
                .unwrap()
        };
        gen(&[
            "-y", "-f", "lavfi", "-i", "testsrc=duration=2:size=320x240:rate=25", "-f", "lavfi",
            "-i", "sine=frequency=440:duration=2", "-shortest", video.to_str().unwrap(),
        ]);
        gen(&["-y", "-f", "lavfi", "-i", "sine=frequency=880:duration=1", voice.to_str().unwrap()]);

        let config = RenderConfig {
            watermark_text: None,
            ..Default::default()
        };
        let artifact = FfmpegRenderer::new(config)
            .render(&RenderRequest {
                video,
                narration_audio: voice,
                hook: "Wait".into(),
                output: dir.path().join("final.mp4"),
            })
            .await
            .unwrap();
        assert!(artifact.duration_seconds > 1.5);
    }
}
