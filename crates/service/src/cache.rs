//! Read-through cache for parsed responses.
//!
//! Entries are keyed by `(CacheKind, request url)` and hold the parsed instance
//! type-erased. A key is written at most once until it expires or is invalidated;
//! concurrent misses on the same key may all hit the backend, the first result
//! to finish is the one kept.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use configs::CacheConfig;
use moka::future::Cache;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    SalesProject,
    SalesProjectWrapper,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: CacheKind,
    pub url: String,
}

impl CacheKey {
    pub fn new(kind: CacheKind, url: impl Into<String>) -> Self {
        Self { kind, url: url.into() }
    }
}

pub type CachedValue = Arc<dyn Any + Send + Sync>;

#[async_trait]
pub trait ResponseCache: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Option<CachedValue>;

    /// Stores `value` unless the key is already present. Returns whether it was stored.
    async fn register(&self, key: CacheKey, value: CachedValue) -> bool;

    async fn invalidate(&self, key: &CacheKey);
}

/// Typed lookup; a value of another type counts as a miss.
pub async fn get_typed<T>(cache: &dyn ResponseCache, key: &CacheKey) -> Option<T>
where
    T: Clone + Send + Sync + 'static,
{
    cache.get(key).await.and_then(|value| value.downcast_ref::<T>().cloned())
}

#[derive(Clone)]
pub struct MokaResponseCache {
    inner: Cache<CacheKey, CachedValue>,
}

impl MokaResponseCache {
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        let inner = Cache::builder().max_capacity(max_capacity).time_to_live(ttl).build();
        Self { inner }
    }

    /// `None` when the cache is disabled in configuration.
    pub fn from_config(cfg: &CacheConfig) -> Option<Self> {
        cfg.enabled
            .then(|| Self::new(cfg.max_capacity, Duration::from_secs(cfg.ttl_secs)))
    }
}

#[async_trait]
impl ResponseCache for MokaResponseCache {
    async fn get(&self, key: &CacheKey) -> Option<CachedValue> {
        self.inner.get(key).await
    }

    async fn register(&self, key: CacheKey, value: CachedValue) -> bool {
        self.inner.entry(key).or_insert(value).await.is_fresh()
    }

    async fn invalidate(&self, key: &CacheKey) {
        self.inner.invalidate(key).await;
    }
}
