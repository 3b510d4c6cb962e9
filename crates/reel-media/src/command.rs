//! FFmpeg command builder and runner.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::error::{MediaError, MediaResult};
use crate::process::CommandRunner;

/// Builder for FFmpeg commands with any number of inputs.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    inputs: Vec<PathBuf>,
    output: PathBuf,
    filter_complex: Option<String>,
    maps: Vec<String>,
    output_args: Vec<String>,
    overwrite: bool,
}

impl FfmpegCommand {
    /// Create a command writing to `output`.
    pub fn new(output: impl AsRef<Path>) -> Self {
        Self {
            inputs: Vec::new(),
            output: output.as_ref().to_path_buf(),
            filter_complex: None,
            maps: Vec::new(),
            output_args: Vec::new(),
            overwrite: true,
        }
    }

    /// Add an input file. Inputs are numbered in insertion order.
    pub fn input(mut self, path: impl AsRef<Path>) -> Self {
        self.inputs.push(path.as_ref().to_path_buf());
        self
    }

    pub fn filter_complex(mut self, graph: impl Into<String>) -> Self {
        self.filter_complex = Some(graph.into());
        self
    }

    /// Map a stream or filter label to the output.
    pub fn map(mut self, label: impl Into<String>) -> Self {
        self.maps.push(label.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }
        args.push("-v".to_string());
        args.push("error".to_string());

        for input in &self.inputs {
            args.push("-i".to_string());
            args.push(input.to_string_lossy().to_string());
        }

        if let Some(graph) = &self.filter_complex {
            args.push("-filter_complex".to_string());
            args.push(graph.clone());
        }

        for label in &self.maps {
            args.push("-map".to_string());
            args.push(label.clone());
        }

        args.extend(self.output_args.iter().cloned());
        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Runs FFmpeg commands through a [`CommandRunner`].
#[derive(Clone)]
pub struct FfmpegRunner {
    runner: Arc<dyn CommandRunner>,
    timeout: Option<Duration>,
}

impl FfmpegRunner {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Run an FFmpeg command; a non-zero exit is an error carrying stderr.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        let args = cmd.build_args();
        debug!(output = %cmd.output().display(), "Running FFmpeg");

        let output = self.runner.run("ffmpeg", &args, self.timeout).await?;
        if output.success() {
            Ok(())
        } else {
            Err(MediaError::ffmpeg_failed(
                format!("FFmpeg exited with status {:?}", output.code),
                Some(output.stderr),
                output.code,
            ))
        }
    }
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::ToolNotFound("ffmpeg".to_string()))
}

/// Check if FFprobe is available.
pub fn check_ffprobe() -> MediaResult<PathBuf> {
    which::which("ffprobe").map_err(|_| MediaError::ToolNotFound("ffprobe".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ProcessOutput;
    use async_trait::async_trait;

    struct ExitWith(i32);

    #[async_trait]
    impl CommandRunner for ExitWith {
        async fn run(
            &self,
            _program: &str,
            _args: &[String],
            _timeout: Option<Duration>,
        ) -> MediaResult<ProcessOutput> {
            Ok(ProcessOutput {
                code: Some(self.0),
                stdout: String::new(),
                stderr: "Invalid data found when processing input".to_string(),
            })
        }
    }

    #[test]
    fn test_command_builder_order() {
        let cmd = FfmpegCommand::new("out.mp4")
            .input("video.mp4")
            .input("voice.mp3")
            .filter_complex("[0:v]null[outv]")
            .map("[outv]")
            .map("[outa]")
            .output_args(["-c:v", "libx264"]);

        assert_eq!(
            cmd.build_args(),
            vec![
                "-y", "-v", "error", "-i", "video.mp4", "-i", "voice.mp3", "-filter_complex",
                "[0:v]null[outv]", "-map", "[outv]", "-map", "[outa]", "-c:v", "libx264",
                "out.mp4"
            ]
        );
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_error() {
        let runner = FfmpegRunner::new(Arc::new(ExitWith(1)));
        let err = runner
            .run(&FfmpegCommand::new("out.mp4").input("in.mp4"))
            .await
            .unwrap_err();
        match err {
            MediaError::FfmpegFailed { exit_code, stderr, .. } => {
                assert_eq!(exit_code, Some(1));
                assert!(stderr.unwrap().contains("Invalid data"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_zero_exit_is_ok() {
        let runner = FfmpegRunner::new(Arc::new(ExitWith(0)));
        runner
            .run(&FfmpegCommand::new("out.mp4").input("in.mp4"))
            .await
            .unwrap();
    }
}
