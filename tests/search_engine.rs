//! End-to-end behaviour of the search engine against in-memory collaborators

use async_trait::async_trait;
use leadrank::cache::{CacheStore, MemoryCacheStore, WarmupStrategy};
use leadrank::search::{Lead, SqlValue};
use leadrank::{Config, Error, InferenceService, RecordStore, ScoringCriteria, SearchEngine, SearchRequest};
use serde_json::json;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

// =============================================================================
// TEST DOUBLES
// =============================================================================

/// Record store returning a fixed row set and counting calls
struct CountingStore {
    rows: Vec<Lead>,
    queries: AtomicUsize,
    fail: bool,
    fail_count: bool,
}

impl CountingStore {
    fn with_rows(rows: Vec<Lead>) -> Arc<Self> {
        Arc::new(Self {
            rows,
            queries: AtomicUsize::new(0),
            fail: false,
            fail_count: false,
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            rows: Vec::new(),
            queries: AtomicUsize::new(0),
            fail: true,
            fail_count: false,
        })
    }

    fn failing_count(rows: Vec<Lead>) -> Arc<Self> {
        Arc::new(Self {
            rows,
            queries: AtomicUsize::new(0),
            fail: false,
            fail_count: true,
        })
    }

    fn calls(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordStore for CountingStore {
    async fn query(&self, _text: &str, _values: &[SqlValue]) -> anyhow::Result<Vec<Lead>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("connection to leads database refused");
        }
        Ok(self.rows.clone())
    }

    async fn count(&self, _text: &str, _values: &[SqlValue]) -> anyhow::Result<u64> {
        if self.fail_count {
            anyhow::bail!("statement timeout counting leads");
        }
        Ok(self.rows.len() as u64)
    }
}

/// Inference service with a canned reply and optional delay
struct ScriptedInference {
    reply: Option<&'static str>,
    delay: Duration,
    calls: AtomicUsize,
}

impl ScriptedInference {
    fn replying(reply: &'static str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(reply),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        })
    }

    fn slow(reply: &'static str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(reply),
            delay,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl InferenceService for ScriptedInference {
    async fn infer(&self, _prompt: &str) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        match self.reply {
            Some(text) => Ok(text.to_string()),
            None => anyhow::bail!("inference backend unavailable"),
        }
    }
}

/// Cache store that is always down
struct DownCache;

#[async_trait]
impl CacheStore for DownCache {
    async fn get(&self, _key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        anyhow::bail!("cache unreachable")
    }

    async fn set(&self, _key: &str, _value: Vec<u8>, _ttl_secs: u64) -> anyhow::Result<()> {
        anyhow::bail!("cache unreachable")
    }
}

/// Cache store whose entries expire only when told to
#[derive(Default)]
struct ManualExpiryCache {
    entries: Mutex<HashMap<String, Vec<u8>>>,
    ttls: Mutex<Vec<u64>>,
}

impl ManualExpiryCache {
    fn expire_all(&self) {
        self.entries.lock().clear();
    }
}

#[async_trait]
impl CacheStore for ManualExpiryCache {
    async fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl_secs: u64) -> anyhow::Result<()> {
        self.ttls.lock().push(ttl_secs);
        self.entries.lock().insert(key.to_string(), value);
        Ok(())
    }
}

fn directors() -> Vec<Lead> {
    vec![
        Lead {
            name: Some("Dana Director".to_string()),
            email: Some("dana@acme.io".to_string()),
            industry: Some("Software".to_string()),
            last_engagement_score: Some(40.0),
            ..Lead::new("1")
        },
        Lead {
            name: Some("Sam Director".to_string()),
            email: Some("sam@globex.com".to_string()),
            ..Lead::new("2")
        },
        Lead {
            name: Some("Lee Director".to_string()),
            company_size: Some("201-500".to_string()),
            ..Lead::new("3")
        },
    ]
}

fn engine_with(
    store: Arc<CountingStore>,
    inference: Arc<ScriptedInference>,
    cache: Arc<dyn CacheStore>,
) -> SearchEngine {
    SearchEngine::new(&Config::default(), store, inference, cache).unwrap()
}

fn engine(store: Arc<CountingStore>, inference: Arc<ScriptedInference>) -> SearchEngine {
    let cache = Arc::new(MemoryCacheStore::from_config(&Config::default().cache));
    engine_with(store, inference, cache)
}

// =============================================================================
// SEARCH
// =============================================================================

#[tokio::test]
async fn test_director_search_then_cache_hit() {
    let store = CountingStore::with_rows(directors());
    let inference = ScriptedInference::replying("70");
    let engine = engine(store.clone(), inference.clone());

    let request = SearchRequest::new().with_query("director").with_page(1).with_limit(10);
    let first = engine.search(&request).await.unwrap();

    assert_eq!(first.page, 1);
    assert_eq!(first.limit, 10);
    assert_eq!(first.total, 3);
    assert_eq!(first.data.len(), 3);
    assert!(first.data.iter().all(|lead| lead.final_score <= 100));
    assert_eq!(store.calls(), 1);
    assert_eq!(inference.calls.load(Ordering::SeqCst), 3);

    let second = engine.search(&request).await.unwrap();
    assert_eq!(second, first);
    assert_eq!(store.calls(), 1);
    assert_eq!(inference.calls.load(Ordering::SeqCst), 3);
    assert_eq!(engine.cache().stats().hits, 1);
}

#[tokio::test]
async fn test_scores_follow_the_composite_formula() {
    let store = CountingStore::with_rows(directors());
    let engine = engine(store, ScriptedInference::replying("70"));

    let result = engine
        .search(&SearchRequest::new().with_query("director"))
        .await
        .unwrap();
    let scores: Vec<u8> = result.data.iter().map(|l| l.final_score).collect();

    // 28 + 12 + 1.5, 28, 28 + 1.5
    assert_eq!(scores, vec![42, 28, 30]);
}

#[tokio::test]
async fn test_rows_keep_store_order() {
    let rows: Vec<Lead> = (0..40).map(|i| Lead::new(format!("lead-{}", i))).collect();
    let store = CountingStore::with_rows(rows.clone());
    let engine = engine(store, ScriptedInference::slow("55", Duration::from_millis(2)));

    let result = engine
        .search(&SearchRequest::new().with_limit(40))
        .await
        .unwrap();
    let ids: Vec<_> = result.data.iter().map(|l| l.lead.id.clone()).collect();
    let expected: Vec<_> = rows.iter().map(|l| l.id.clone()).collect();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn test_omitted_and_explicit_defaults_hit_the_same_entry() {
    let store = CountingStore::with_rows(directors());
    let engine = engine(store.clone(), ScriptedInference::replying("70"));

    engine
        .search(&SearchRequest::new().with_query("director"))
        .await
        .unwrap();
    engine
        .search(
            &SearchRequest::new()
                .with_query("Director")
                .with_page(1)
                .with_limit(20)
                .with_sort("score", "desc"),
        )
        .await
        .unwrap();

    assert_eq!(store.calls(), 1);
}

#[tokio::test]
async fn test_validation_error_does_no_work() {
    let store = CountingStore::with_rows(directors());
    let inference = ScriptedInference::replying("70");
    let engine = engine(store.clone(), inference.clone());

    let request = SearchRequest::from_value(&json!({ "query": "director", "limit": 500 })).unwrap();
    let err = engine.search(&request).await.unwrap_err();

    assert!(err.is_validation());
    assert_eq!(err.field(), Some("limit"));
    assert_eq!(store.calls(), 0);
    assert_eq!(inference.calls.load(Ordering::SeqCst), 0);
    assert_eq!(engine.cache().stats().misses, 0);
}

#[tokio::test]
async fn test_query_error_propagates_with_context() {
    let store = CountingStore::failing();
    let engine = engine(store.clone(), ScriptedInference::replying("70"));

    let err = engine
        .search(&SearchRequest::new().with_query("director"))
        .await
        .unwrap_err();

    match &err {
        Error::Query { operation, source } => {
            assert_eq!(*operation, "execute search query");
            assert!(source.to_string().contains("refused"));
        }
        other => panic!("expected query error, got {:?}", other),
    }

    // Nothing was cached, so the next call hits the store again
    let _ = engine.search(&SearchRequest::new().with_query("director")).await;
    assert_eq!(store.calls(), 2);
}

#[tokio::test]
async fn test_count_error_propagates_with_context() {
    let mut config = Config::default();
    config.search.exact_total = true;
    let store = CountingStore::failing_count(directors());
    let cache = Arc::new(MemoryCacheStore::from_config(&config.cache));
    let engine = SearchEngine::new(
        &config,
        store,
        ScriptedInference::replying("70"),
        cache.clone(),
    )
    .unwrap();

    let err = engine
        .search(&SearchRequest::new().with_query("director"))
        .await
        .unwrap_err();

    match &err {
        Error::Query { operation, source } => {
            assert_eq!(*operation, "count matching leads");
            assert!(source.to_string().contains("statement timeout"));
        }
        other => panic!("expected query error, got {:?}", other),
    }
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_expired_entry_is_recomputed() {
    let store = CountingStore::with_rows(directors());
    let inference = ScriptedInference::replying("70");
    let cache = Arc::new(ManualExpiryCache::default());
    let engine = engine_with(store.clone(), inference.clone(), cache.clone());
    let request = SearchRequest::new().with_query("director");

    let first = engine.search(&request).await.unwrap();
    engine.search(&request).await.unwrap();
    assert_eq!(store.calls(), 1);
    assert_eq!(*cache.ttls.lock(), vec![300]);

    cache.expire_all();
    let refreshed = engine.search(&request).await.unwrap();

    assert_eq!(refreshed, first);
    assert_eq!(store.calls(), 2);
    assert_eq!(inference.calls.load(Ordering::SeqCst), 6);
    assert_eq!(*cache.ttls.lock(), vec![300, 300]);
}

#[tokio::test]
async fn test_inference_outage_still_returns_scores() {
    let store = CountingStore::with_rows(directors());
    let engine = engine(store, ScriptedInference::failing());

    let result = engine
        .search(&SearchRequest::new().with_query("director"))
        .await
        .unwrap();

    // Fallback 50 * 0.4 = 20 before engagement/firmographic terms
    let scores: Vec<u8> = result.data.iter().map(|l| l.final_score).collect();
    assert_eq!(scores, vec![34, 20, 22]);
}

#[tokio::test]
async fn test_cache_outage_still_returns_results() {
    let store = CountingStore::with_rows(directors());
    let engine = engine_with(
        store.clone(),
        ScriptedInference::replying("70"),
        Arc::new(DownCache),
    );

    let request = SearchRequest::new().with_query("director");
    let first = engine.search(&request).await.unwrap();
    let second = engine.search(&request).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.total, 3);
    assert_eq!(store.calls(), 2);
}

// =============================================================================
// CANCELLATION
// =============================================================================

#[tokio::test]
async fn test_cancelled_search_is_not_cached() {
    let store = CountingStore::with_rows(directors());
    let engine = Arc::new(engine(
        store.clone(),
        ScriptedInference::slow("70", Duration::from_secs(5)),
    ));
    let cancel = CancellationToken::new();
    let request = SearchRequest::new().with_query("director");

    let task = {
        let engine = Arc::clone(&engine);
        let cancel = cancel.clone();
        let request = request.clone();
        tokio::spawn(async move {
            engine
                .search_with_cancel(&request, &ScoringCriteria::default(), &cancel)
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();

    let outcome = tokio::time::timeout(Duration::from_secs(1), task)
        .await
        .expect("cancellation should be prompt")
        .unwrap();
    assert!(matches!(outcome, Err(Error::Cancelled)));

    let key = engine.cache().derive_key(&engine_params(&request));
    assert!(engine.cache().get(&key).await.is_none());
}

#[tokio::test]
async fn test_already_cancelled_token_short_circuits() {
    let store = CountingStore::with_rows(directors());
    let engine = engine(store.clone(), ScriptedInference::replying("70"));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcome = engine
        .search_with_cancel(&SearchRequest::new(), &ScoringCriteria::default(), &cancel)
        .await;
    assert!(matches!(outcome, Err(Error::Cancelled)));
    assert_eq!(store.calls(), 0);
}

fn engine_params(request: &SearchRequest) -> leadrank::search::SearchParams {
    request.validate(&Config::default().search).unwrap()
}

// =============================================================================
// WARM-UP
// =============================================================================

fn popular() -> Vec<SearchRequest> {
    vec![
        SearchRequest::new().with_query("director"),
        SearchRequest::new().with_industry("Software"),
        SearchRequest::new().with_company_size("51-200").with_page(2),
    ]
}

#[tokio::test]
async fn test_warmup_skips_when_ratio_is_healthy() {
    let store = CountingStore::with_rows(directors());
    let engine = engine(store.clone(), ScriptedInference::replying("70"));

    let report = engine
        .warm_cache(&WarmupStrategy::new(popular()).with_hit_ratio(0.9))
        .await
        .unwrap();

    assert!(report.skipped);
    assert_eq!(report.attempted, 0);
    assert_eq!(store.calls(), 0);

    let report = engine
        .warm_cache(&WarmupStrategy::new(popular()).with_hit_ratio(0.8))
        .await
        .unwrap();
    assert!(report.skipped);
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_warmup_runs_each_popular_set_once() {
    let store = CountingStore::with_rows(directors());
    let engine = engine(store.clone(), ScriptedInference::replying("70"));

    let report = engine
        .warm_cache(&WarmupStrategy::new(popular()).with_hit_ratio(0.2))
        .await
        .unwrap();

    assert!(!report.skipped);
    assert_eq!(report.attempted, 3);
    assert_eq!(report.warmed, 3);
    assert_eq!(report.failed, 0);
    assert_eq!(store.calls(), 3);

    // Warmed entries now serve foreground searches
    for request in popular() {
        engine.search(&request).await.unwrap();
    }
    assert_eq!(store.calls(), 3);
}

#[tokio::test]
async fn test_warmup_uses_observed_ratio_and_counts_failures() {
    let store = CountingStore::with_rows(directors());
    let engine = engine(store.clone(), ScriptedInference::replying("70"));

    // One miss, no hits: observed ratio 0.0
    engine.search(&SearchRequest::new()).await.unwrap();
    assert_eq!(engine.cache().hit_ratio(), 0.0);

    let mut sets = popular();
    sets.push(SearchRequest::new().with_page(0));
    let report = engine
        .warm_cache(&WarmupStrategy::new(sets).with_threshold(0.5))
        .await
        .unwrap();

    assert_eq!(report.hit_ratio, 0.0);
    assert_eq!(report.threshold, 0.5);
    assert_eq!(report.attempted, 4);
    assert_eq!(report.warmed, 3);
    assert_eq!(report.failed, 1);
    assert_eq!(store.calls(), 4);
}

#[tokio::test]
async fn test_background_warmup_does_not_block_search() {
    let store = CountingStore::with_rows(directors());
    let engine = Arc::new(engine(
        store.clone(),
        ScriptedInference::slow("70", Duration::from_millis(20)),
    ));

    let strategy = WarmupStrategy::from_value(json!({
        "popular": [{ "query": "director" }, { "industry": "Software" }],
        "hitRatio": 0.0
    }))
    .unwrap();
    let handle = Arc::clone(&engine).spawn_warmup(strategy);

    let foreground = engine
        .search(&SearchRequest::new().with_company_size("11-50"))
        .await
        .unwrap();
    assert_eq!(foreground.total, 3);

    let report = handle.await.unwrap().unwrap();
    assert_eq!(report.warmed, 2);
}
