use std::{num::NonZeroUsize, sync::Mutex};

use graphloom_runtime::operation_cache::OperationCache;
use lru::LruCache;

/// Bounded in-memory cache with strict least-recently-used discard. Reads
/// refresh recency, so the whole map sits behind one mutex; insert, evict and
/// the recency update are a single critical section.
pub struct InMemoryOperationCache<V> {
    inner: Mutex<LruCache<String, V>>,
}

impl<V> InMemoryOperationCache<V> {
    pub fn new(limit: usize) -> Self {
        let capacity = NonZeroUsize::new(limit.max(1)).expect("max(1) is non-zero");
        InMemoryOperationCache {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }
}

impl<V> Default for InMemoryOperationCache<V> {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl<V: Clone + Send + Sync> OperationCache<V> for InMemoryOperationCache<V> {
    async fn get(&self, key: &str) -> Option<V> {
        self.inner.lock().expect("poisoned").get(key).cloned()
    }

    async fn insert(&self, key: String, value: V) {
        self.inner.lock().expect("poisoned").put(key, value);
    }

    fn entry_count(&self) -> usize {
        self.inner.lock().expect("poisoned").len()
    }
}

/// Cache used when plan caching is disabled: every lookup misses and nothing
/// is retained.
pub struct NoopOperationCache;

impl<V: Send + Sync> OperationCache<V> for NoopOperationCache {
    async fn get(&self, _key: &str) -> Option<V> {
        None
    }

    async fn insert(&self, _key: String, _value: V) {}

    fn entry_count(&self) -> usize {
        0
    }
}
