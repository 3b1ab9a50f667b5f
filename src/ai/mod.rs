//! Inference backends for lead scoring

pub mod ollama;

pub use ollama::OllamaInference;

use async_trait::async_trait;

/// Remote text-completion service.
///
/// Any error or unparseable reply is treated by the scoring engine as a
/// fallback case; implementations should not retry on their own.
#[async_trait]
pub trait InferenceService: Send + Sync {
    async fn infer(&self, prompt: &str) -> anyhow::Result<String>;
}
