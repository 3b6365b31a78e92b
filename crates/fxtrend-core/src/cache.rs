//! Time-boxed memoization of provider responses.
//!
//! The cache sits in front of a [`RateSource`] and never inside the
//! predictor: a hit returns exactly the series a miss would have stored,
//! so predictions do not depend on cache state.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use time::Date;
use tracing::debug;

use crate::data_source::{HistoryRequest, LatestRequest, RateSource, SourceError};
use crate::{CurrencyCode, LatestRates, ProviderId, RateSeries};

/// Default time-to-live: ten minutes.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(600);

/// Defines how a request interacts with the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Read a non-expired entry if present; otherwise fetch and store. (Default)
    #[default]
    Use,
    /// Always fetch, then overwrite the stored entry.
    Refresh,
    /// Always fetch; never read or write the cache.
    Bypass,
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

#[derive(Debug)]
struct CacheInner<K, V> {
    map: HashMap<K, CacheEntry<V>>,
    default_ttl: Duration,
}

impl<K: Eq + Hash, V: Clone> CacheInner<K, V> {
    fn new(default_ttl: Duration) -> Self {
        Self {
            map: HashMap::new(),
            default_ttl,
        }
    }

    fn get(&self, key: &K) -> Option<V> {
        self.map.get(key).and_then(|entry| {
            if Instant::now() <= entry.expires_at {
                Some(entry.value.clone())
            } else {
                None
            }
        })
    }

    /// Inserting also drops every entry that has already expired.
    fn put(&mut self, key: K, value: V) {
        self.clear_expired();
        let expires_at = Instant::now() + self.default_ttl;
        self.map.insert(key, CacheEntry { value, expires_at });
    }

    fn clear_expired(&mut self) {
        let now = Instant::now();
        self.map.retain(|_, entry| entry.expires_at > now);
    }
}

/// Thread-safe in-memory TTL store.
#[derive(Debug)]
pub struct CacheStore<K, V> {
    inner: Arc<tokio::sync::RwLock<CacheInner<K, V>>>,
}

impl<K, V> Clone for CacheStore<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: Eq + Hash, V: Clone> CacheStore<K, V> {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(tokio::sync::RwLock::new(CacheInner::new(default_ttl))),
        }
    }

    /// A store that never keeps anything (TTL is zero).
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Returns `None` when absent, expired, or the store is disabled.
    pub async fn get(&self, key: &K) -> Option<V> {
        let store = self.inner.read().await;
        store.get(key)
    }

    /// No-op when the store is disabled.
    pub async fn put(&self, key: K, value: V) {
        let mut store = self.inner.write().await;
        if store.default_ttl == Duration::ZERO {
            return;
        }
        store.put(key, value);
    }

    pub async fn clear_expired(&self) {
        let mut store = self.inner.write().await;
        store.clear_expired();
    }

    pub async fn clear(&self) {
        let mut store = self.inner.write().await;
        store.map.clear();
    }

    /// Number of entries, including expired ones not yet evicted by a `put`.
    pub async fn len(&self) -> usize {
        let store = self.inner.read().await;
        store.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn is_disabled(&self) -> bool {
        let store = self.inner.read().await;
        store.default_ttl == Duration::ZERO
    }
}

/// Cache key for a history window.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HistoryKey {
    pub provider: ProviderId,
    pub base: CurrencyCode,
    pub quote: CurrencyCode,
    pub start: Date,
    pub end: Date,
}

impl HistoryKey {
    pub fn new(provider: ProviderId, req: &HistoryRequest) -> Self {
        Self {
            provider,
            base: req.base.clone(),
            quote: req.quote.clone(),
            start: req.start(),
            end: req.end,
        }
    }
}

/// Cache key for latest rates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LatestKey {
    pub provider: ProviderId,
    pub base: CurrencyCode,
}

/// A [`RateSource`] that memoizes another source's successful answers.
///
/// Failures are never cached.
pub struct CachedSource<S> {
    source: S,
    mode: CacheMode,
    history: CacheStore<HistoryKey, RateSeries>,
    latest: CacheStore<LatestKey, LatestRates>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<S: RateSource> CachedSource<S> {
    pub fn new(source: S, ttl: Duration) -> Self {
        Self {
            source,
            mode: CacheMode::Use,
            history: CacheStore::new(ttl),
            latest: CacheStore::new(ttl),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn with_mode(mut self, mode: CacheMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn inner(&self) -> &S {
        &self.source
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub async fn clear(&self) {
        self.history.clear().await;
        self.latest.clear().await;
    }

    /// Entries held across the history and latest stores.
    pub async fn cached_entries(&self) -> usize {
        self.history.len().await + self.latest.len().await
    }

    async fn cached_history(&self, req: HistoryRequest) -> Result<RateSeries, SourceError> {
        let key = HistoryKey::new(self.source.id(), &req);

        if self.mode == CacheMode::Use {
            if let Some(series) = self.history.get(&key).await {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(provider = %key.provider, base = %key.base, quote = %key.quote, "history cache hit");
                return Ok(series);
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let series = self.source.history(req).await?;
        if self.mode != CacheMode::Bypass {
            self.history.put(key, series.clone()).await;
        }
        Ok(series)
    }

    async fn cached_latest(&self, req: LatestRequest) -> Result<LatestRates, SourceError> {
        let key = LatestKey {
            provider: self.source.id(),
            base: req.base.clone(),
        };

        if self.mode == CacheMode::Use {
            if let Some(latest) = self.latest.get(&key).await {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(provider = %key.provider, base = %key.base, "latest cache hit");
                return Ok(latest);
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let latest = self.source.latest(req).await?;
        if self.mode != CacheMode::Bypass {
            self.latest.put(key, latest.clone()).await;
        }
        Ok(latest)
    }
}

impl<S: RateSource> RateSource for CachedSource<S> {
    fn id(&self) -> ProviderId {
        self.source.id()
    }

    fn history<'a>(
        &'a self,
        req: HistoryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RateSeries, SourceError>> + Send + 'a>> {
        Box::pin(self.cached_history(req))
    }

    fn latest<'a>(
        &'a self,
        req: LatestRequest,
    ) -> Pin<Box<dyn Future<Output = Result<LatestRates, SourceError>> + Send + 'a>> {
        Box::pin(self.cached_latest(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cache_store_basic_operations() {
        let cache = CacheStore::new(Duration::from_secs(1));

        assert!(cache.get(&"key1").await.is_none());

        cache.put("key1", 1_u32).await;
        assert_eq!(cache.get(&"key1").await, Some(1));

        cache.put("key1", 2).await;
        assert_eq!(cache.get(&"key1").await, Some(2));
    }

    #[tokio::test]
    async fn test_cache_expiration() {
        let cache = CacheStore::new(Duration::from_millis(100));

        cache.put("key1", 1_u32).await;
        assert!(cache.get(&"key1").await.is_some());

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(cache.get(&"key1").await.is_none());
    }

    #[tokio::test]
    async fn test_cache_clear_expired() {
        let cache = CacheStore::new(Duration::from_millis(100));

        cache.put("key1", 1_u32).await;
        cache.put("key2", 2_u32).await;
        assert_eq!(cache.len().await, 2);

        tokio::time::sleep(Duration::from_millis(150)).await;
        cache.clear_expired().await;

        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_cache_put_evicts_expired_entries() {
        let cache = CacheStore::new(Duration::from_millis(50));

        cache.put("day1", 1_u32).await;
        cache.put("day2", 2_u32).await;
        tokio::time::sleep(Duration::from_millis(100)).await;

        cache.put("day3", 3_u32).await;

        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get(&"day3").await, Some(3));
    }

    #[tokio::test]
    async fn test_cache_disabled() {
        let cache = CacheStore::disabled();

        assert!(cache.is_disabled().await);

        cache.put("key1", 1_u32).await;
        assert!(cache.get(&"key1").await.is_none());
        assert_eq!(cache.len().await, 0);
    }

    #[test]
    fn test_cache_mode_default() {
        assert_eq!(CacheMode::default(), CacheMode::Use);
    }
}
