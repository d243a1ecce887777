//! Prompt-in, text-out client for a locally hosted language model.
//!
//! Callers use [`TextGenerator::generate`], which never fails: every problem
//! is turned into a readable string carrying the [`FAILURE_MARKER`] prefix.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::config::LlmConfig;
use crate::errors::ServiceError;

/// Prefix shared by every soft failure string.
pub const FAILURE_MARKER: &str = "[AI ERROR";

/// Placeholder returned when the model answers with nothing.
pub const NO_RESPONSE: &str = "(no response from AI)";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("[AI ERROR]: Ollama is not running. Please start it with 'ollama serve'.")]
    Unreachable,

    #[error("[AI ERROR]: Model not found. Run 'ollama pull {0}'")]
    ModelNotFound(String),

    #[error("[AI ERROR]: Model failed to load. Not enough memory.")]
    ModelLoadFailed,

    #[error("[AI ERROR]: No response within {0} seconds.")]
    Timeout(u64),

    #[error("[AI ERROR {code}]: {body}")]
    Status { code: u16, body: String },

    #[error("[AI ERROR]: Unreadable response: {0}")]
    InvalidResponse(String),

    #[error("[AI ERROR]: {0}")]
    Request(String),
}

/// True when `text` is one of the soft failure strings.
pub fn is_failure(text: &str) -> bool {
    text.starts_with(FAILURE_MARKER)
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Single best-effort completion. Failures come back as text.
    async fn generate(&self, prompt: &str) -> String;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Client for the Ollama `/api/generate` endpoint.
#[derive(Debug, Clone)]
pub struct OllamaGenerator {
    client: Client,
    endpoint: String,
    model: String,
    timeout_secs: u64,
}

impl OllamaGenerator {
    pub fn new(config: &LlmConfig) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                ServiceError::ExternalServiceError(format!(
                    "failed to construct HTTP client for text generation: {}",
                    e
                ))
            })?;

        Ok(Self::with_client(config, client))
    }

    /// Build a generator from an existing client (useful for testing).
    pub fn with_client(config: &LlmConfig, client: Client) -> Self {
        Self {
            client,
            endpoint: format!("{}/api/generate", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            timeout_secs: config.timeout_secs,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One request, no retry. A blank completion maps to [`NO_RESPONSE`].
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    pub async fn try_generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        debug!(status = status.as_u16(), "Text generation responded");

        match status {
            StatusCode::OK => {
                let body: GenerateResponse = response
                    .json()
                    .await
                    .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;
                let text = body.response.trim();
                if text.is_empty() {
                    Ok(NO_RESPONSE.to_string())
                } else {
                    Ok(text.to_string())
                }
            }
            StatusCode::NOT_FOUND => Err(GenerationError::ModelNotFound(self.model.clone())),
            StatusCode::INTERNAL_SERVER_ERROR => Err(GenerationError::ModelLoadFailed),
            other => {
                let body = response.text().await.unwrap_or_default();
                Err(GenerationError::Status {
                    code: other.as_u16(),
                    body,
                })
            }
        }
    }

    fn classify(&self, err: reqwest::Error) -> GenerationError {
        if err.is_timeout() {
            GenerationError::Timeout(self.timeout_secs)
        } else if err.is_connect() {
            GenerationError::Unreachable
        } else {
            GenerationError::Request(err.to_string())
        }
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    async fn generate(&self, prompt: &str) -> String {
        match self.try_generate(prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Text generation failed");
                e.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_failure_carries_the_marker() {
        let failures = [
            GenerationError::Unreachable,
            GenerationError::ModelNotFound("qwen2:1.5b".into()),
            GenerationError::ModelLoadFailed,
            GenerationError::Timeout(90),
            GenerationError::Status {
                code: 503,
                body: "busy".into(),
            },
            GenerationError::InvalidResponse("eof".into()),
            GenerationError::Request("builder".into()),
        ];

        for failure in failures {
            assert!(is_failure(&failure.to_string()), "{failure}");
        }
        assert!(!is_failure(NO_RESPONSE));
    }

    #[test]
    fn status_failure_names_the_code() {
        let err = GenerationError::Status {
            code: 418,
            body: "teapot".into(),
        };
        assert_eq!(err.to_string(), "[AI ERROR 418]: teapot");
    }

    #[test]
    fn endpoint_joins_base_url() {
        let config = LlmConfig {
            base_url: "http://localhost:11434/".into(),
            ..LlmConfig::default()
        };
        let generator = OllamaGenerator::new(&config).unwrap();
        assert_eq!(generator.endpoint(), "http://localhost:11434/api/generate");
        assert_eq!(generator.model(), "qwen2:1.5b");
    }
}
