//! Search orchestration
//!
//! `ValidateParams -> CacheLookup -> { hit: return | miss: ExecuteQuery ->
//! ScoreResults -> StoreCache -> return }`
//!
//! Validation failures stop before any I/O. Record-store failures are wrapped
//! with the failing operation and returned. Inference and cache failures are
//! absorbed further down and never reach the caller.
//!
//! Two concurrent misses on the same key both compute and both write. That
//! costs redundant work but cannot corrupt an entry, so no cross-request lock
//! is taken.

use crate::ai::InferenceService;
use crate::cache::warmup::needs_warmup;
use crate::cache::{CacheCoordinator, CacheStore, WarmupReport, WarmupStrategy};
use crate::core::config::Config;
use crate::core::error::{Error, Result};
use crate::scoring::ScoringEngine;
use crate::search::params::{ScoringCriteria, SearchParams, SearchRequest};
use crate::search::query::QueryBuilder;
use crate::search::results::SearchResult;
use crate::store::RecordStore;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct SearchEngine {
    builder: QueryBuilder,
    store: Arc<dyn RecordStore>,
    scoring: ScoringEngine,
    cache: CacheCoordinator,
    exact_total: bool,
    warmup_threshold: f64,
}

impl SearchEngine {
    pub fn new(
        config: &Config,
        store: Arc<dyn RecordStore>,
        inference: Arc<dyn InferenceService>,
        cache_store: Arc<dyn CacheStore>,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            builder: QueryBuilder::new(config.search.clone()),
            store,
            scoring: ScoringEngine::new(inference, config.scoring.clone()),
            cache: CacheCoordinator::new(cache_store, config.cache.clone()),
            exact_total: config.search.exact_total,
            warmup_threshold: config.cache.warmup_threshold,
        })
    }

    pub fn cache(&self) -> &CacheCoordinator {
        &self.cache
    }

    pub fn scoring(&self) -> &ScoringEngine {
        &self.scoring
    }

    /// Search with default scoring criteria
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResult> {
        self.search_with(request, &ScoringCriteria::default()).await
    }

    pub async fn search_with(
        &self,
        request: &SearchRequest,
        criteria: &ScoringCriteria,
    ) -> Result<SearchResult> {
        self.search_with_cancel(request, criteria, &CancellationToken::new())
            .await
    }

    /// Search, abandoning in-flight work if `cancel` fires.
    ///
    /// A cancelled search returns [`Error::Cancelled`] and leaves the cache
    /// untouched.
    pub async fn search_with_cancel(
        &self,
        request: &SearchRequest,
        criteria: &ScoringCriteria,
        cancel: &CancellationToken,
    ) -> Result<SearchResult> {
        let params = self.builder.validate(request)?;
        criteria.validate()?;

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let key = self.cache.derive_key_with(&params, criteria);

        let pipeline = async {
            if let Some(hit) = self.cache.get(&key).await {
                return Ok((hit, true));
            }
            self.execute(&params, criteria).await.map(|r| (r, false))
        };

        let (result, cached) = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(key = %key, "Search cancelled");
                return Err(Error::Cancelled);
            }
            outcome = pipeline => outcome?,
        };

        if !cached {
            self.cache.put(&key, &result).await;
        }
        Ok(result)
    }

    /// Recompute and store a result without consulting the cache
    async fn refresh(&self, params: &SearchParams, criteria: &ScoringCriteria) -> Result<SearchResult> {
        let key = self.cache.derive_key_with(params, criteria);
        let result = self.execute(params, criteria).await?;
        self.cache.put(&key, &result).await;
        Ok(result)
    }

    /// Query, count, and score one page
    async fn execute(&self, params: &SearchParams, criteria: &ScoringCriteria) -> Result<SearchResult> {
        let start = Instant::now();
        let query = self.builder.build(params, criteria)?;

        let mut leads = self
            .store
            .query(&query.text, &query.values)
            .await
            .map_err(|e| Error::query("execute search query", e))?;

        if leads.len() > params.limit as usize {
            warn!(
                rows = leads.len(),
                limit = params.limit,
                "Record store returned more rows than requested, truncating"
            );
            leads.truncate(params.limit as usize);
        }

        let total = if self.exact_total {
            let count = self.builder.build_count(params);
            self.store
                .count(&count.text, &count.values)
                .await
                .map_err(|e| Error::query("count matching leads", e))?
        } else {
            leads.len() as u64
        };

        let data = self.scoring.score_all(leads, criteria).await;

        debug!(
            rows = data.len(),
            total,
            page = params.page,
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Search executed"
        );

        Ok(SearchResult {
            data,
            page: params.page,
            limit: params.limit,
            total,
        })
    }

    /// Re-run popular searches when the hit ratio is below threshold.
    ///
    /// Runs sequentially. A failing parameter set is logged and counted; it
    /// does not stop the pass.
    pub async fn warm_cache(&self, strategy: &WarmupStrategy) -> Result<WarmupReport> {
        strategy.validate()?;

        let started_at = Utc::now();
        let start = Instant::now();
        let threshold = strategy.threshold.unwrap_or(self.warmup_threshold);
        let hit_ratio = strategy.hit_ratio.unwrap_or_else(|| self.cache.hit_ratio());
        let criteria = strategy.criteria.unwrap_or_default();

        let mut report = WarmupReport {
            started_at,
            hit_ratio,
            threshold,
            skipped: false,
            attempted: 0,
            warmed: 0,
            failed: 0,
            elapsed_ms: 0.0,
        };

        if !needs_warmup(hit_ratio, threshold) {
            info!(hit_ratio, threshold, "Cache hit ratio healthy, skipping warm-up");
            report.skipped = true;
            return Ok(report);
        }

        info!(
            hit_ratio,
            threshold,
            sets = strategy.popular.len(),
            "Warming search cache"
        );

        for request in &strategy.popular {
            report.attempted += 1;
            let outcome = match self.builder.validate(request) {
                Ok(params) => self.refresh(&params, &criteria).await.map(|_| ()),
                Err(e) => Err(e),
            };
            match outcome {
                Ok(()) => report.warmed += 1,
                Err(e) => {
                    warn!(error = %e, "Warm-up search failed");
                    report.failed += 1;
                }
            }
        }

        report.elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        info!(
            warmed = report.warmed,
            failed = report.failed,
            elapsed_ms = report.elapsed_ms,
            "Warm-up complete"
        );
        Ok(report)
    }

    /// Run warm-up on a detached task so foreground searches are never blocked
    pub fn spawn_warmup(self: Arc<Self>, strategy: WarmupStrategy) -> JoinHandle<Result<WarmupReport>> {
        tokio::spawn(async move { self.warm_cache(&strategy).await })
    }
}
