//! Speech synthesis of narration text into an audio file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{GenAiError, GenAiResult};

/// Default speech endpoint.
pub const DEFAULT_TTS_URL: &str = "https://translate.google.com/translate_tts";

/// Longest text the endpoint accepts in one request.
pub const MAX_CHUNK_CHARS: usize = 100;

/// Turns text into a spoken audio file.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Write spoken `text` to `output` and return the path.
    async fn synthesize(&self, text: &str, language: &str, output: &Path) -> GenAiResult<PathBuf>;
}

#[derive(Debug, Clone)]
pub struct TtsConfig {
    pub url: String,
    pub timeout: Duration,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_TTS_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Speech synthesizer backed by the public translate TTS endpoint.
///
/// Output is MP3; chunk responses are concatenated in order.
pub struct GoogleTts {
    http: Client,
    config: TtsConfig,
}

impl GoogleTts {
    pub fn new(config: TtsConfig) -> GenAiResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("reel-genai/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(GenAiError::Network)?;

        Ok(Self { http, config })
    }

    async fn fetch_chunk(
        &self,
        chunk: &str,
        language: &str,
        idx: usize,
        total: usize,
    ) -> GenAiResult<Vec<u8>> {
        let total_param = total.to_string();
        let idx_param = idx.to_string();
        let textlen = chunk.chars().count().to_string();

        let response = self
            .http
            .get(&self.config.url)
            .query(&[
                ("ie", "UTF-8"),
                ("q", chunk),
                ("tl", language),
                ("client", "tw-ob"),
                ("total", total_param.as_str()),
                ("idx", idx_param.as_str()),
                ("textlen", textlen.as_str()),
            ])
            .send()
            .await
            .map_err(|e| GenAiError::speech_failed(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenAiError::speech_failed(format!(
                "speech endpoint returned {} for chunk {}/{}",
                status,
                idx + 1,
                total
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GenAiError::speech_failed(format!("failed to read audio: {}", e)))?;
        if bytes.is_empty() {
            return Err(GenAiError::speech_failed(format!(
                "empty audio for chunk {}/{}",
                idx + 1,
                total
            )));
        }
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTts {
    async fn synthesize(&self, text: &str, language: &str, output: &Path) -> GenAiResult<PathBuf> {
        let chunks = split_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(GenAiError::speech_failed("no text to synthesize"));
        }

        info!(language, chunks = chunks.len(), "Synthesizing narration");

        let mut audio = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            let bytes = self.fetch_chunk(chunk, language, idx, chunks.len()).await?;
            debug!(idx, bytes = bytes.len(), "Received speech chunk");
            audio.extend_from_slice(&bytes);
        }

        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent).await?;
        }
        let mut file = fs::File::create(output).await?;
        file.write_all(&audio).await?;
        file.flush().await?;

        Ok(output.to_path_buf())
    }
}

/// Split text into chunks of at most `max_chars` characters.
///
/// Breaks on whitespace; a single word longer than the limit is cut hard.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        while word.len() > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = word.split_off(max_chars);
            chunks.push(word.into_iter().collect());
            word = rest;
        }
        if word.is_empty() {
            continue;
        }

        let needed = if current.is_empty() { word.len() } else { word.len() + 1 };
        if current_len + needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.extend(word.iter());
        current_len += word.len();
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
