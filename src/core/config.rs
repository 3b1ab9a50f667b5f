//! Configuration management

use crate::core::error::{Error, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Hard ceiling on a result page. Also bounds inference fan-out per request.
pub const MAX_SEARCH_RESULTS: u32 = 100;

/// Global configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub search: SearchConfig,
    pub scoring: ScoringConfig,
    pub cache: CacheConfig,
    pub inference: InferenceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Page size when the request omits `limit`
    pub default_limit: u32,
    /// Largest accepted `limit`
    pub max_results: u32,
    /// Run a COUNT query for `total` instead of reporting the page length
    pub exact_total: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Score used when inference fails or returns garbage
    pub fallback_score: u8,
    /// Points awarded when industry or company size is known (before weighting)
    pub firmographic_bonus: f64,
    /// Concurrent inference calls per search
    pub max_concurrency: usize,
    /// Per-call inference timeout (milliseconds)
    pub inference_timeout_ms: u64,
    pub weights: ScoringWeights,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub relevance: f64,
    pub engagement: f64,
    pub firmographic: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Entry lifetime in seconds. This is the staleness bound for results.
    pub ttl_secs: u64,
    /// Warm-up runs when the hit ratio falls below this
    pub warmup_threshold: f64,
    /// Prefix for derived cache keys
    pub key_prefix: String,
    /// Entry capacity of the in-process store
    pub capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Ollama server URL
    pub base_url: String,
    /// Model used for lead quality estimates
    pub model: String,
    /// HTTP request timeout (seconds)
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_results: MAX_SEARCH_RESULTS,
            exact_total: false,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            fallback_score: 50,
            firmographic_bonus: 5.0,
            max_concurrency: 8,
            inference_timeout_ms: 5_000,
            weights: ScoringWeights::default(),
        }
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            relevance: 0.4,
            engagement: 0.3,
            firmographic: 0.3,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            warmup_threshold: 0.8,
            key_prefix: "leadrank:search".to_string(),
            capacity: 1000,
        }
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3".to_string(),
            timeout_secs: 30,
        }
    }
}

impl ScoringConfig {
    pub fn inference_timeout(&self) -> Duration {
        Duration::from_millis(self.inference_timeout_ms)
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Config {
    /// Load configuration from default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a specific file; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml_str(&content)
        } else {
            Ok(Config::default())
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engine cannot honour
    pub fn validate(&self) -> Result<()> {
        let w = &self.scoring.weights;
        for (name, value) in [
            ("relevance", w.relevance),
            ("engagement", w.engagement),
            ("firmographic", w.firmographic),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(config_error(format!(
                    "scoring.weights.{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        if !self.scoring.firmographic_bonus.is_finite() || self.scoring.firmographic_bonus < 0.0 {
            return Err(config_error("scoring.firmographic_bonus must be non-negative"));
        }
        if self.scoring.fallback_score > 100 {
            return Err(config_error("scoring.fallback_score must be within 0..=100"));
        }
        if self.scoring.inference_timeout_ms == 0 {
            return Err(config_error("scoring.inference_timeout_ms must be at least 1"));
        }
        if self.scoring.max_concurrency == 0 {
            return Err(config_error("scoring.max_concurrency must be at least 1"));
        }
        if self.search.max_results == 0 || self.search.max_results > MAX_SEARCH_RESULTS {
            return Err(config_error(format!(
                "search.max_results must be within 1..={}",
                MAX_SEARCH_RESULTS
            )));
        }
        if self.search.default_limit == 0 || self.search.default_limit > self.search.max_results {
            return Err(config_error(
                "search.default_limit must be within 1..=search.max_results",
            ));
        }
        if !(0.0..=1.0).contains(&self.cache.warmup_threshold) {
            return Err(config_error("cache.warmup_threshold must be within 0.0..=1.0"));
        }
        if self.cache.ttl_secs == 0 {
            return Err(config_error("cache.ttl_secs must be at least 1"));
        }
        if self.cache.capacity == 0 {
            return Err(config_error("cache.capacity must be at least 1"));
        }
        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::leadrank_home()?.join("config.toml"))
    }

    /// Get the leadrank home directory
    pub fn leadrank_home() -> Result<PathBuf> {
        // Check LEADRANK_HOME env var first
        if let Ok(home) = std::env::var("LEADRANK_HOME") {
            return Ok(PathBuf::from(home));
        }

        ProjectDirs::from("dev", "leadrank", "leadrank")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .ok_or_else(|| config_error("Could not determine leadrank home directory"))
    }
}

fn config_error(message: impl Into<String>) -> Error {
    Error::Config {
        message: message.into(),
    }
}
