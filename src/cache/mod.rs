//! Search result caching and warm-up

mod coordinator;
mod lru;
pub mod warmup;

pub use coordinator::{CacheCoordinator, CacheStats};
pub use lru::MemoryCacheStore;
pub use warmup::{WarmupReport, WarmupStrategy};

use async_trait::async_trait;

/// Remote key/value store with TTL support (Redis, Memcached, in-process)
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>>;

    async fn set(&self, key: &str, value: Vec<u8>, ttl_secs: u64) -> anyhow::Result<()>;
}
