// src/cache/memory_cache.rs

use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use crate::cache::{glob_match, CacheBackend};

const DEFAULT_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// In-process LRU cache tier with per-entry expiry. Serves as the local tier
/// in front of Redis and as the backend in tests.
pub struct MemoryBackend {
    entries: Mutex<LruCache<String, Entry>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity is non-zero");
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Drop every expired entry.
    pub fn purge_expired(&self) {
        let mut entries = self.entries.lock();
        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, e)| e.is_expired())
            .map(|(k, _)| k.clone())
            .collect();
        for key in expired {
            entries.pop(&key);
        }
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    fn is_enabled(&self) -> bool {
        true
    }

    async fn get_raw(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock();
        if matches!(entries.peek(key), Some(entry) if entry.is_expired()) {
            entries.pop(key);
            return None;
        }
        entries.get(key).map(|entry| entry.value.clone())
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Option<Duration>) -> bool {
        let entry = Entry {
            value: value.to_string(),
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        };
        self.entries.lock().put(key.to_string(), entry);
        true
    }

    async fn delete(&self, key: &str) -> bool {
        self.entries.lock().pop(key).is_some()
    }

    async fn exists(&self, key: &str) -> bool {
        self.get_raw(key).await.is_some()
    }

    async fn keys_matching(&self, pattern: &str) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter(|(key, entry)| !entry.is_expired() && glob_match(pattern, key))
            .map(|(key, _)| key.clone())
            .collect()
    }

    async fn key_count(&self) -> usize {
        self.purge_expired();
        self.entries.lock().len()
    }

    async fn memory_usage(&self) -> u64 {
        self.entries
            .lock()
            .iter()
            .map(|(k, e)| (k.len() + e.value.len()) as u64)
            .sum()
    }
}
