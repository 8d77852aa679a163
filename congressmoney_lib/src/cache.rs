//! In-memory TTL cache backed by `DashMap` with single-flight population.

use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::OnceCell;

/// A single cached value with its expiration time.
///
/// The cell is created empty and filled by whichever caller gets there
/// first; later callers for the same key await that fill.
struct CacheEntry<V> {
    cell: OnceCell<V>,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn empty(expires_at: Instant) -> Self {
        Self {
            cell: OnceCell::new(),
            expires_at,
        }
    }
}

/// Thread-safe in-memory cache with time-to-live expiration.
///
/// Values are populated at most once per key per TTL window, even when many
/// tasks ask for the same key concurrently. Expired entries are replaced
/// lazily on the next access for that key.
pub struct MemoryCache<K, V> {
    store: DashMap<K, Arc<CacheEntry<V>>>,
    ttl: Duration,
}

impl<K, V> MemoryCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates a new cache with the given time-to-live for entries.
    pub fn new(ttl: Duration) -> Self {
        Self {
            store: DashMap::new(),
            ttl,
        }
    }

    /// Returns the live entry for `key`, installing a fresh empty one if the
    /// key is missing or expired. The map guard is released before returning.
    fn live_entry(&self, key: K) -> Arc<CacheEntry<V>> {
        let now = Instant::now();
        let mut slot = self
            .store
            .entry(key)
            .or_insert_with(|| Arc::new(CacheEntry::empty(now + self.ttl)));
        if now > slot.expires_at {
            *slot = Arc::new(CacheEntry::empty(now + self.ttl));
        }
        Arc::clone(&slot)
    }

    /// Returns the cached value, or runs `init` to produce it.
    ///
    /// Concurrent callers for the same key share one `init` run.
    pub async fn get_or_init<F, Fut>(&self, key: K, init: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let entry = self.live_entry(key);
        entry.cell.get_or_init(init).await.clone()
    }

    /// Number of entries, including ones not yet populated or already expired.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}
