use lru::LruCache;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::error::Result;

/// A cached value with an absolute expiry timestamp. Expired entries are
/// dropped lazily on lookup; there is no background sweeper.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    value: T,
    expires_at: Instant,
}

impl<T> CacheEntry<T> {
    pub fn new(value: T, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    pub fn value(&self) -> &T {
        &self.value
    }
}

/// Thread-safe TTL cache with per-key single-flight fetching.
///
/// Uses Arc<Mutex<>> around an LRU map for safe concurrent access across
/// tasks; capacity bounds memory while the TTL bounds staleness. The
/// single-flight map guarantees at most one upstream fetch per key is in
/// flight at a time — concurrent callers for the same key wait on the first
/// fetch and then read its cached result.
#[derive(Clone)]
pub struct TtlCache<V> {
    entries: Arc<Mutex<LruCache<String, CacheEntry<V>>>>,
    flights: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
    default_ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    /// # Panics
    /// Panics if capacity is 0
    pub fn new(capacity: usize, default_ttl: Duration) -> Self {
        let cache = LruCache::new(NonZeroUsize::new(capacity).expect("Capacity must be non-zero"));
        Self {
            entries: Arc::new(Mutex::new(cache)),
            flights: Arc::new(Mutex::new(HashMap::new())),
            default_ttl,
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let mut cache = self.entries.lock().unwrap();
        match cache.get(key) {
            Some(entry) if !entry.is_expired() => Some(entry.value().clone()),
            Some(_) => {
                cache.pop(key);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, key: String, value: V) {
        self.put_with_ttl(key, value, self.default_ttl);
    }

    /// If cache is at capacity, the least recently used entry is evicted.
    pub fn put_with_ttl(&self, key: String, value: V, ttl: Duration) {
        let mut cache = self.entries.lock().unwrap();
        cache.put(key, CacheEntry::new(value, ttl));
    }

    /// Generate a stable hash key for arbitrary input text.
    pub fn generate_key(&self, input: &str) -> String {
        let mut hasher = DefaultHasher::new();
        input.as_bytes().hash(&mut hasher);
        format!("{:x}", hasher.finish())
    }

    /// Cache-or-fetch with single-flight semantics. The fetch runs at most
    /// once per key at a time; waiters observe the winner's cached result.
    /// A failed fetch is not cached, so the next caller retries it.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        if let Some(hit) = self.get(key) {
            return Ok(hit);
        }

        let flight = {
            let mut flights = self.flights.lock().unwrap();
            flights
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };

        let guard = flight.lock().await;

        // The winning flight may have populated the cache while we waited.
        if let Some(hit) = self.get(key) {
            return Ok(hit);
        }

        let result = fetch().await;
        if let Ok(ref value) = result {
            self.put(key.to_string(), value.clone());
        }

        drop(guard);

        // Drop the flight slot once no other caller holds it.
        let mut flights = self.flights.lock().unwrap();
        if let Some(entry) = flights.get(key) {
            if Arc::strong_count(entry) <= 2 {
                flights.remove(key);
            }
        }

        result
    }
}
