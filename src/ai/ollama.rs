//! Ollama inference backend
//!
//! Sends lead-quality prompts to a local or remote Ollama server through the
//! non-streaming `/api/generate` endpoint.
//!
//! @module ai/ollama

use super::InferenceService;
use crate::core::config::InferenceConfig;
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

// =============================================================================
// REQUEST/RESPONSE TYPES
// =============================================================================

/// Ollama generate request
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

/// Ollama generation options
#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: i32,
}

/// Ollama generate response
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
    #[allow(dead_code)]
    #[serde(default)]
    done: bool,
}

// =============================================================================
// OLLAMA CLIENT
// =============================================================================

/// Ollama client implementing [`InferenceService`]
pub struct OllamaInference {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaInference {
    pub fn new(config: &InferenceConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(2))
            .pool_max_idle_per_host(10)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }

    /// Create connection error with helpful message
    fn connection_error(&self, e: reqwest::Error) -> anyhow::Error {
        if e.is_connect() {
            anyhow!(
                "Cannot connect to Ollama at {}. Make sure Ollama is running (ollama serve).",
                self.base_url
            )
        } else if e.is_timeout() {
            anyhow!("Ollama request timed out; model '{}' may still be loading", self.model)
        } else {
            anyhow!("Ollama request failed: {}", e)
        }
    }
}

#[async_trait]
impl InferenceService for OllamaInference {
    async fn infer(&self, prompt: &str) -> anyhow::Result<String> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                // Scores should be repeatable for the same lead
                temperature: 0.0,
                num_predict: 8,
            },
        };

        let res = self
            .client
            .post(self.generate_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| self.connection_error(e))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            if status.as_u16() == 404 && text.contains("model") {
                return Err(anyhow!(
                    "Model '{}' not found. Run 'ollama pull {}' to download it.",
                    self.model,
                    self.model
                ));
            }
            return Err(anyhow!("Ollama generate failed: HTTP {} - {}", status, text));
        }

        let response: GenerateResponse = res
            .json()
            .await
            .context("Failed to parse Ollama generate response")?;

        debug!(model = %self.model, chars = response.response.len(), "Ollama inference complete");
        Ok(response.response)
    }
}

// =============================================================================
// TESTS
// =============================================================================
