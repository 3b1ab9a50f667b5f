use super::CacheStore;
use crate::core::config::CacheConfig;
use crate::core::error::CacheError;
use crate::search::params::{ScoringCriteria, SearchParams};
use crate::search::results::SearchResult;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Lookup counters since construction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    /// Fraction of lookups served from cache; 0.0 before any lookup
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// What gets hashed into a cache key
#[derive(Serialize)]
struct KeyMaterial<'a> {
    params: &'a SearchParams,
    #[serde(skip_serializing_if = "Option::is_none")]
    criteria: Option<&'a ScoringCriteria>,
}

/// Cache front for search results.
///
/// Store failures never escape: a failed read is a miss and a failed write is
/// logged and dropped. Entries are only refreshed by TTL expiry or a later
/// miss; writes to lead data do not invalidate them.
pub struct CacheCoordinator {
    store: Arc<dyn CacheStore>,
    config: CacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheCoordinator {
    pub fn new(store: Arc<dyn CacheStore>, config: CacheConfig) -> Self {
        Self {
            store,
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Key for validated params with default criteria
    pub fn derive_key(&self, params: &SearchParams) -> String {
        self.derive_key_with(params, &ScoringCriteria::default())
    }

    /// Key for validated params; non-default criteria are folded in
    pub fn derive_key_with(&self, params: &SearchParams, criteria: &ScoringCriteria) -> String {
        let material = KeyMaterial {
            params,
            criteria: (!criteria.is_default()).then_some(criteria),
        };
        // Serializing plain structs into a String cannot fail
        let canonical = serde_json::to_string(&material).unwrap_or_default();
        let hash = xxhash_rust::xxh3::xxh3_64(canonical.as_bytes());
        format!("{}:{:016x}", self.config.key_prefix, hash)
    }

    /// Look up a result. Store or decode failures count as a miss.
    pub async fn get(&self, key: &str) -> Option<SearchResult> {
        match self.try_get(key).await {
            Ok(Some(result)) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, "Cache hit");
                Some(result)
            }
            Ok(None) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, "Cache miss");
                None
            }
            Err(e) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                warn!(key = %key, error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }

    /// Store a result with the configured TTL
    pub async fn put(&self, key: &str, value: &SearchResult) {
        self.put_with_ttl(key, value, self.config.ttl()).await
    }

    /// Store a result with an explicit TTL. Failures are logged only.
    pub async fn put_with_ttl(&self, key: &str, value: &SearchResult, ttl: Duration) {
        let ttl_secs = ttl.as_secs().max(1);
        if let Err(e) = self.try_put(key, value, ttl_secs).await {
            warn!(key = %key, error = %e, "Cache write failed, result not cached");
        } else {
            debug!(key = %key, ttl_secs, rows = value.data.len(), "Cached search result");
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    pub fn hit_ratio(&self) -> f64 {
        self.stats().hit_ratio()
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    async fn try_get(&self, key: &str) -> Result<Option<SearchResult>, CacheError> {
        match self.store.get(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn try_put(&self, key: &str, value: &SearchResult, ttl_secs: u64) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(value)?;
        self.store.set(key, bytes, ttl_secs).await?;
        Ok(())
    }
}
