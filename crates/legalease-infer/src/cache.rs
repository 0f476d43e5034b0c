//! LRU cache for per-chunk model results.
//!
//! Inference runs without sampling, so the same chunk always yields the same
//! output and regenerating a summary or repeating a question can reuse it.
//! Default: 512 entries, 1-hour TTL.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

/// Thread-safe LRU cache keyed by the model input.
pub struct ResultCache<V> {
    inner: Mutex<CacheInner<V>>,
}

struct CacheInner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    order: Vec<String>,
    max_size: usize,
    ttl: Duration,
}

impl<V: Clone> ResultCache<V> {
    /// Create a new cache with the given capacity and TTL.
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::with_capacity(max_size),
                order: Vec::with_capacity(max_size),
                max_size,
                ttl,
            }),
        }
    }

    pub fn with_capacity(max_size: usize) -> Self {
        Self::new(max_size, Duration::from_secs(3600))
    }

    /// Get a cached value. Returns None on miss or expired entry.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.inner.lock();

        let ttl = inner.ttl;
        let (value, expired) = match inner.entries.get(key) {
            Some(entry) => (entry.value.clone(), entry.inserted_at.elapsed() >= ttl),
            None => return None,
        };

        if let Some(pos) = inner.order.iter().position(|k| k == key) {
            let k = inner.order.remove(pos);
            if !expired {
                inner.order.push(k);
            }
        }
        if expired {
            inner.entries.remove(key);
            return None;
        }
        Some(value)
    }

    /// Insert a value, evicting the least recently used entry when full.
    pub fn put(&self, key: String, value: V) {
        let mut inner = self.inner.lock();
        if inner.max_size == 0 {
            return;
        }

        if inner.entries.contains_key(&key) {
            inner.order.retain(|k| k != &key);
        }

        while inner.entries.len() >= inner.max_size && !inner.order.is_empty() {
            let oldest = inner.order.remove(0);
            inner.entries.remove(&oldest);
        }

        inner.order.push(key.clone());
        inner.entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Number of entries in the cache.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.order.clear();
    }
}
