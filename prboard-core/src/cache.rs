//! In-memory TTL cache with single-flight population
//!
//! Entries are keyed by [`Fingerprint`] and expire `ttl` after they were
//! stored. Expired entries are not dropped on expiry: they stay readable
//! through [`QueryCache::peek`] until a later populate replaces them, so a
//! failed refresh never leaves consumers with nothing to show.
//!
//! Each key has its own async mutex acting as the single-flight guard. A
//! caller that misses takes the guard before populating; concurrent callers
//! for the same key queue on the guard and then find the freshly stored
//! value instead of calling upstream again.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::debug;

use crate::fingerprint::Fingerprint;
use crate::Result;

struct CacheEntry<V> {
    value: Arc<V>,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// TTL cache keyed by query fingerprint
pub struct QueryCache<V> {
    ttl: Duration,
    entries: RwLock<HashMap<Fingerprint, CacheEntry<V>>>,
    flights: Mutex<HashMap<Fingerprint, Arc<Mutex<()>>>>,
}

impl<V> QueryCache<V>
where
    V: Send + Sync,
{
    /// Create an empty cache whose entries live for `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
            flights: Mutex::new(HashMap::new()),
        }
    }

    /// Time-to-live applied to newly stored entries
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the value for `key` if it has not expired
    pub async fn get(&self, key: &Fingerprint) -> Option<Arc<V>> {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .get(key)
            .filter(|entry| entry.is_fresh(now))
            .map(|entry| Arc::clone(&entry.value))
    }

    /// Return the stored value for `key`, expired or not
    pub async fn peek(&self, key: &Fingerprint) -> Option<Arc<V>> {
        self.entries
            .read()
            .await
            .get(key)
            .map(|entry| Arc::clone(&entry.value))
    }

    /// When the stored value for `key` expires
    pub async fn expires_at(&self, key: &Fingerprint) -> Option<Instant> {
        self.entries.read().await.get(key).map(|entry| entry.expires_at)
    }

    /// Number of stored entries, including expired ones
    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Return the fresh value for `key`, populating it on a miss
    ///
    /// At most one `populate` runs per key at a time. If it fails the error is
    /// returned, the guard is released and any previous value is kept.
    pub async fn get_or_populate<F, Fut>(&self, key: &Fingerprint, populate: F) -> Result<Arc<V>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        if let Some(value) = self.get(key).await {
            debug!(key = %key, "Cache hit");
            return Ok(value);
        }

        let flight = self.flight(key).await;
        let _guard = flight.lock().await;

        // Another caller may have populated while we waited on the guard
        if let Some(value) = self.get(key).await {
            debug!(key = %key, "Cache populated by concurrent caller");
            return Ok(value);
        }

        debug!(key = %key, "Cache miss");
        self.populate(key, populate).await
    }

    /// Repopulate `key` regardless of freshness
    ///
    /// Returns `Ok(None)` without calling `populate` when a population for
    /// the key is already in flight.
    pub async fn refresh<F, Fut>(&self, key: &Fingerprint, populate: F) -> Result<Option<Arc<V>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        let flight = self.flight(key).await;
        let Ok(_guard) = flight.try_lock() else {
            debug!(key = %key, "Population already in flight, skipping refresh");
            return Ok(None);
        };

        self.populate(key, populate).await.map(Some)
    }

    /// Drop expired entries and idle single-flight guards
    ///
    /// Returns the number of entries removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let removed = {
            let mut entries = self.entries.write().await;
            let before = entries.len();
            entries.retain(|_, entry| entry.is_fresh(now));
            before - entries.len()
        };

        // A guard referenced only by the map has no holder and no waiters
        self.flights
            .lock()
            .await
            .retain(|_, flight| Arc::strong_count(flight) > 1);

        if removed > 0 {
            debug!(removed, "Purged expired cache entries");
        }
        removed
    }

    async fn flight(&self, key: &Fingerprint) -> Arc<Mutex<()>> {
        let mut flights = self.flights.lock().await;
        Arc::clone(flights.entry(key.clone()).or_default())
    }

    async fn populate<F, Fut>(&self, key: &Fingerprint, populate: F) -> Result<Arc<V>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        let value = Arc::new(populate().await?);
        let expires_at = Instant::now() + self.ttl;

        self.entries.write().await.insert(
            key.clone(),
            CacheEntry {
                value: Arc::clone(&value),
                expires_at,
            },
        );

        debug!(key = %key, ttl_secs = self.ttl.as_secs(), "Cache populated");
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TTL: Duration = Duration::from_secs(60);

    fn key(name: &str) -> Fingerprint {
        Fingerprint::named(name)
    }

    async fn counted(calls: &AtomicUsize, value: u32) -> Result<u32> {
        calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(value)
    }

    #[tokio::test(start_paused = true)]
    async fn test_miss_populates_and_hit_reuses() {
        let cache = QueryCache::new(TTL);
        let calls = AtomicUsize::new(0);

        let first = cache
            .get_or_populate(&key("prs"), || counted(&calls, 1))
            .await
            .unwrap();
        let second = cache
            .get_or_populate(&key("prs"), || counted(&calls, 2))
            .await
            .unwrap();

        assert_eq!(*first, 1);
        assert_eq!(*second, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_before_expiry_is_cached() {
        let cache = QueryCache::new(TTL);
        let calls = AtomicUsize::new(0);

        cache
            .get_or_populate(&key("prs"), || counted(&calls, 1))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(30)).await;

        let value = cache
            .get_or_populate(&key("prs"), || counted(&calls, 2))
            .await
            .unwrap();

        assert_eq!(*value, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_after_expiry_repopulates() {
        let cache = QueryCache::new(TTL);
        let calls = AtomicUsize::new(0);

        cache
            .get_or_populate(&key("prs"), || counted(&calls, 1))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(61)).await;

        assert!(cache.get(&key("prs")).await.is_none());
        let value = cache
            .get_or_populate(&key("prs"), || counted(&calls, 2))
            .await
            .unwrap();

        assert_eq!(*value, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_populates_collapse_to_one_fetch() {
        let cache = QueryCache::new(TTL);
        let calls = AtomicUsize::new(0);
        let prs = key("prs");

        let (a, b) = tokio::join!(
            cache.get_or_populate(&prs, || counted(&calls, 1)),
            cache.get_or_populate(&prs, || counted(&calls, 2)),
        );

        assert_eq!(*a.unwrap(), 1);
        assert_eq!(*b.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_distinct_keys_populate_independently() {
        let cache = QueryCache::new(TTL);
        let calls = AtomicUsize::new(0);

        let (one, two) = (key("one"), key("two"));

        let (a, b) = tokio::join!(
            cache.get_or_populate(&one, || counted(&calls, 1)),
            cache.get_or_populate(&two, || counted(&calls, 2)),
        );

        assert_eq!(*a.unwrap(), 1);
        assert_eq!(*b.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_releases_guard() {
        let cache: QueryCache<u32> = QueryCache::new(TTL);

        let err = cache
            .get_or_populate(&key("prs"), || async {
                Err(Error::Other("rate limited".to_string()))
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("rate limited"));
        assert!(cache.peek(&key("prs")).await.is_none());

        let value = cache
            .get_or_populate(&key("prs"), || async { Ok(7) })
            .await
            .unwrap();
        assert_eq!(*value, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_keeps_stale_value() {
        let cache: QueryCache<u32> = QueryCache::new(TTL);

        cache
            .get_or_populate(&key("prs"), || async { Ok(1) })
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(120)).await;

        let result = cache
            .get_or_populate(&key("prs"), || async {
                Err(Error::Other("upstream down".to_string()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(cache.peek(&key("prs")).await.as_deref(), Some(&1));
        assert!(cache.get(&key("prs")).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_replaces_fresh_value() {
        let cache: QueryCache<u32> = QueryCache::new(TTL);

        cache
            .get_or_populate(&key("prs"), || async { Ok(1) })
            .await
            .unwrap();
        let refreshed = cache.refresh(&key("prs"), || async { Ok(2) }).await.unwrap();

        assert_eq!(refreshed.as_deref(), Some(&2));
        assert_eq!(cache.get(&key("prs")).await.as_deref(), Some(&2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_skipped_while_in_flight() {
        let cache = QueryCache::new(TTL);
        let calls = AtomicUsize::new(0);

        let prs = key("prs");

        let (populated, refreshed) = tokio::join!(
            cache.get_or_populate(&prs, || counted(&calls, 1)),
            cache.refresh(&prs, || counted(&calls, 2)),
        );

        assert_eq!(*populated.unwrap(), 1);
        assert!(refreshed.unwrap().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expires_at_tracks_ttl() {
        let cache: QueryCache<u32> = QueryCache::new(TTL);
        let start = Instant::now();

        cache
            .get_or_populate(&key("prs"), || async { Ok(1) })
            .await
            .unwrap();

        assert_eq!(cache.expires_at(&key("prs")).await, Some(start + TTL));
        assert_eq!(cache.expires_at(&key("other")).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let cache: QueryCache<u32> = QueryCache::new(TTL);

        cache
            .get_or_populate(&key("old"), || async { Ok(1) })
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(45)).await;
        cache
            .get_or_populate(&key("new"), || async { Ok(2) })
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(30)).await;

        assert_eq!(cache.purge_expired().await, 1);
        assert!(cache.peek(&key("old")).await.is_none());
        assert_eq!(cache.peek(&key("new")).await.as_deref(), Some(&2));
    }
}
