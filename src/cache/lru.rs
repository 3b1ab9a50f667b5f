use super::CacheStore;
use crate::core::config::CacheConfig;
use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

struct Entry {
    bytes: Vec<u8>,
    expires_at: Instant,
}

/// In-process LRU cache store with per-entry expiry.
///
/// Expired entries are dropped lazily on read. The lock is never held across
/// an await point.
pub struct MemoryCacheStore {
    cache: Mutex<LruCache<String, Entry>>,
}

impl MemoryCacheStore {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.capacity)
    }

    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }

    pub fn clear(&self) {
        self.cache.lock().clear();
    }

    fn get_at(&self, key: &str, now: Instant) -> Option<Vec<u8>> {
        let mut cache = self.cache.lock();
        match cache.get(key) {
            Some(entry) if entry.expires_at > now => Some(entry.bytes.clone()),
            Some(_) => {
                cache.pop(key);
                None
            }
            None => None,
        }
    }
}

impl Default for MemoryCacheStore {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        Ok(self.get_at(key, Instant::now()))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl_secs: u64) -> anyhow::Result<()> {
        let entry = Entry {
            bytes: value,
            expires_at: Instant::now() + Duration::from_secs(ttl_secs),
        };
        self.cache.lock().put(key.to_string(), entry);
        Ok(())
    }
}
