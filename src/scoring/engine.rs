use crate::ai::InferenceService;
use crate::core::config::ScoringConfig;
use crate::core::error::InferenceError;
use crate::scoring::prompt::{build_prompt, parse_score};
use crate::search::params::ScoringCriteria;
use crate::search::results::{Lead, ScoredLead};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, warn};

/// Composite lead scorer.
///
/// `final = round(clamp(ai * w_relevance + engagement * w_engagement
///                      + bonus * w_firmographic, 0, 100))`
/// where `ai` is the inference estimate or the configured fallback and the
/// bonus applies only when industry or company size is known.
pub struct ScoringEngine {
    inference: Arc<dyn InferenceService>,
    config: ScoringConfig,
}

impl ScoringEngine {
    pub fn new(inference: Arc<dyn InferenceService>, config: ScoringConfig) -> Self {
        Self { inference, config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score one lead. Inference failures fall back; this never errors.
    pub async fn score(&self, lead: &Lead, criteria: &ScoringCriteria) -> u8 {
        let base = match self.estimate(lead, criteria).await {
            Ok(score) => score,
            Err(e) => {
                warn!(lead = %lead.id, error = %e, "Inference failed, using fallback score");
                self.config.fallback_score
            }
        };
        self.combine(base, lead)
    }

    /// Score a page of leads with at most `max_concurrency` inference calls in
    /// flight. Output order matches input order.
    pub async fn score_all(&self, leads: Vec<Lead>, criteria: &ScoringCriteria) -> Vec<ScoredLead> {
        let width = self.config.max_concurrency.max(1);
        debug!(rows = leads.len(), width, "Scoring result page");

        stream::iter(leads)
            .map(|lead| async move {
                let final_score = self.score(&lead, criteria).await;
                ScoredLead { lead, final_score }
            })
            .buffered(width)
            .collect()
            .await
    }

    /// Ask the inference backend for a 0..=100 estimate
    async fn estimate(&self, lead: &Lead, criteria: &ScoringCriteria) -> Result<u8, InferenceError> {
        let prompt = build_prompt(lead, criteria);
        let reply = tokio::time::timeout(self.config.inference_timeout(), self.inference.infer(&prompt))
            .await
            .map_err(|_| InferenceError::Timeout(self.config.inference_timeout_ms))??;
        parse_score(&reply)
    }

    /// Apply local weighting to a base estimate
    pub fn combine(&self, base: u8, lead: &Lead) -> u8 {
        let weights = &self.config.weights;

        let engagement = lead
            .last_engagement_score
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
            * weights.engagement;

        let firmographic = if lead.has_firmographics() {
            self.config.firmographic_bonus * weights.firmographic
        } else {
            0.0
        };

        let raw = base as f64 * weights.relevance + engagement + firmographic;
        if raw.is_nan() {
            return 0;
        }
        raw.clamp(0.0, 100.0).round() as u8
    }
}
