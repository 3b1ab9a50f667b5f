//! Cache warm-up strategy
//!
//! A strategy names the parameter sets worth keeping hot. When the hit ratio
//! (supplied by the caller, or observed by the cache coordinator) drops below
//! the threshold, each set is re-run once so its result lands in the cache.

use crate::core::error::{Error, Result};
use crate::search::params::{ScoringCriteria, SearchRequest};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WarmupStrategy {
    /// Popular parameter sets, run in order
    pub popular: Vec<SearchRequest>,
    /// Caller-observed hit ratio; the coordinator's own counters otherwise
    pub hit_ratio: Option<f64>,
    /// Overrides `cache.warmup_threshold`
    pub threshold: Option<f64>,
    /// Criteria applied to every warm-up search
    pub criteria: Option<ScoringCriteria>,
}

impl WarmupStrategy {
    pub fn new(popular: Vec<SearchRequest>) -> Self {
        Self {
            popular,
            ..Default::default()
        }
    }

    pub fn with_hit_ratio(mut self, ratio: f64) -> Self {
        self.hit_ratio = Some(ratio);
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Decode an operator-supplied strategy map
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let strategy: WarmupStrategy = serde_json::from_value(value)
            .map_err(|e| Error::validation("strategy", e.to_string()))?;
        strategy.validate()?;
        Ok(strategy)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(ratio) = self.hit_ratio {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(Error::validation("hitRatio", "must be within 0.0..=1.0"));
            }
        }
        if let Some(threshold) = self.threshold {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(Error::validation("threshold", "must be within 0.0..=1.0"));
            }
        }
        if let Some(criteria) = &self.criteria {
            criteria.validate()?;
        }
        Ok(())
    }
}

/// Warm-up decision for a ratio and threshold
pub fn needs_warmup(hit_ratio: f64, threshold: f64) -> bool {
    hit_ratio < threshold
}

/// Outcome of one warm-up pass
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WarmupReport {
    pub started_at: DateTime<Utc>,
    pub hit_ratio: f64,
    pub threshold: f64,
    /// Ratio was at or above threshold; nothing ran
    pub skipped: bool,
    pub attempted: usize,
    pub warmed: usize,
    pub failed: usize,
    pub elapsed_ms: f64,
}
