//! FFprobe duration lookup.

use std::path::Path;
use std::time::Duration;

use crate::error::{MediaError, MediaResult};
use crate::process::CommandRunner;

const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Probe a media file's container duration in seconds.
///
/// Fails unless ffprobe reports a finite, positive number.
pub async fn probe_duration(runner: &dyn CommandRunner, path: impl AsRef<Path>) -> MediaResult<f64> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    let args: Vec<String> = [
        "-v",
        "error",
        "-show_entries",
        "format=duration",
        "-of",
        "default=noprint_wrappers=1:nokey=1",
    ]
    .iter()
    .map(|s| s.to_string())
    .chain(std::iter::once(path.to_string_lossy().to_string()))
    .collect();

    let output = runner.run("ffprobe", &args, Some(PROBE_TIMEOUT)).await?;
    if !output.success() {
        return Err(MediaError::FfprobeFailed {
            message: format!("FFprobe exited with status {:?}", output.code),
            stderr: Some(output.stderr),
        });
    }

    parse_duration(&output.stdout)
}

fn parse_duration(stdout: &str) -> MediaResult<f64> {
    let raw = stdout.trim();
    let duration: f64 = raw
        .parse()
        .map_err(|_| MediaError::invalid_output(format!("unparseable duration: {:?}", raw)))?;

    if !duration.is_finite() || duration <= 0.0 {
        return Err(MediaError::invalid_output(format!(
            "non-positive duration: {}",
            duration
        )));
    }
    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ProcessOutput;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    struct Stdout {
        text: &'static str,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CommandRunner for Stdout {
        async fn run(
            &self,
            program: &str,
            args: &[String],
            _timeout: Option<Duration>,
        ) -> MediaResult<ProcessOutput> {
            let mut seen = self.seen.lock().unwrap();
            seen.push(program.to_string());
            seen.extend(args.iter().cloned());
            Ok(ProcessOutput {
                code: Some(0),
                stdout: self.text.to_string(),
                stderr: String::new(),
            })
        }
    }

    #[test]
    fn test_parse_duration() {
        assert!((parse_duration("12.345000\n").unwrap() - 12.345).abs() < 1e-9);
        assert!(parse_duration("N/A").is_err());
        assert!(parse_duration("0.000000").is_err());
        assert!(parse_duration("-3").is_err());
        assert!(parse_duration("").is_err());
    }

    #[tokio::test]
    async fn test_probe_invokes_ffprobe() {
        let file = NamedTempFile::new().unwrap();
        let runner = Stdout {
            text: "8.5\n",
            seen: Mutex::new(Vec::new()),
        };

        let d = probe_duration(&runner, file.path()).await.unwrap();
        assert!((d - 8.5).abs() < 1e-9);

        let seen = runner.seen.lock().unwrap();
        assert_eq!(seen[0], "ffprobe");
        assert!(seen.contains(&"format=duration".to_string()));
    }

    #[tokio::test]
    async fn test_probe_missing_file() {
        let runner = Stdout {
            text: "1.0",
            seen: Mutex::new(Vec::new()),
        };
        let err = probe_duration(&runner, "/nonexistent/clip.mp4").await.unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
