//! Chat completions HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, info};

use crate::error::{GenAiError, GenAiResult};
use crate::types::{ChatRequest, CompletionBody, CompletionResponse};

/// Default completions endpoint (OpenAI-compatible router).
pub const DEFAULT_GENERATOR_URL: &str = "https://router.huggingface.co/v1/chat/completions";

/// Default instruction-tuned model.
pub const DEFAULT_GENERATOR_MODEL: &str = "mistralai/Mistral-7B-Instruct-v0.2";

/// Produces free text for a chat prompt.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Return the text of the first completion choice.
    async fn complete(&self, request: &ChatRequest) -> GenAiResult<String>;
}

/// Configuration for the chat client.
#[derive(Debug, Clone)]
pub struct ChatClientConfig {
    /// Completions endpoint URL
    pub url: String,
    /// Bearer API key
    pub api_key: String,
    /// Model identifier
    pub model: String,
    /// Request timeout
    pub timeout: Duration,
}

impl ChatClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            url: DEFAULT_GENERATOR_URL.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_GENERATOR_MODEL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Client for an OpenAI-compatible chat completions endpoint.
pub struct ChatClient {
    http: Client,
    config: ChatClientConfig,
}

impl ChatClient {
    /// Create a new chat client.
    pub fn new(config: ChatClientConfig) -> GenAiResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(GenAiError::Network)?;

        Ok(Self { http, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl TextGenerator for ChatClient {
    async fn complete(&self, request: &ChatRequest) -> GenAiResult<String> {
        let body = CompletionBody {
            model: &self.config.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        debug!(model = %self.config.model, "Sending chat completion request");

        let response = self
            .http
            .post(&self.config.url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenAiError::Timeout(self.config.timeout.as_secs())
                } else {
                    GenAiError::Network(e)
                }
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(GenAiError::Unauthorized(format!(
                "generator returned {}",
                status
            )));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GenAiError::request_failed(format!(
                "generator returned {}: {}",
                status, text
            )));
        }

        let completion: CompletionResponse = response.json().await.map_err(|e| {
            GenAiError::invalid_response(format!("failed to parse completion: {}", e))
        })?;

        let text = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| GenAiError::invalid_response("no content in completion"))?;

        info!(model = %self.config.model, chars = text.len(), "Chat completion received");
        Ok(text)
    }
}
