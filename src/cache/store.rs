// src/cache/store.rs

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

use crate::cache::{CacheBackend, CacheDomain, MemoryBackend, RedisBackend, TtlTable};

/// Bound on how long the local tier may serve a value without consulting the
/// remote keyspace (which invalidation operates on).
const LOCAL_TTL: Duration = Duration::from_secs(60);

/// Two-tier cache facade: an in-process LRU tier in front of the remote
/// backend, with typed JSON (de)serialization.
///
/// When the remote backend is disabled the store as a whole is disabled —
/// every operation degrades to a no-op so a cache outage never fails the
/// request pipeline.
pub struct CacheStore {
    local: MemoryBackend,
    remote: Arc<dyn CacheBackend>,
    ttls: TtlTable,
}

impl CacheStore {
    pub fn new(remote: RedisBackend, ttls: TtlTable) -> Self {
        Self::with_backend(Arc::new(remote), ttls)
    }

    pub fn with_backend(remote: Arc<dyn CacheBackend>, ttls: TtlTable) -> Self {
        Self {
            local: MemoryBackend::new(),
            remote,
            ttls,
        }
    }

    /// Store with no usable backend; caches nothing.
    pub fn disabled() -> Self {
        Self::with_backend(Arc::new(RedisBackend::disabled()), TtlTable::with_defaults())
    }

    pub fn is_enabled(&self) -> bool {
        self.remote.is_enabled()
    }

    pub fn ttl_for(&self, domain: CacheDomain) -> Duration {
        self.ttls.ttl_for(domain)
    }

    /// Typed lookup. Misses, disabled state, and malformed cached data all
    /// return `None`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if !self.is_enabled() {
            return None;
        }

        if let Some(raw) = self.local.get_raw(key).await {
            match serde_json::from_str(&raw) {
                Ok(value) => {
                    debug!(key, tier = "local", "cache hit");
                    return Some(value);
                }
                Err(e) => {
                    debug!(key, "malformed local cache entry treated as miss: {}", e);
                    self.local.delete(key).await;
                }
            }
        }

        let raw = self.remote.get_raw(key).await?;
        match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!(key, tier = "remote", "cache hit");
                self.local.set_raw(key, &raw, Some(LOCAL_TTL)).await;
                Some(value)
            }
            Err(e) => {
                debug!(key, "malformed cache entry treated as miss: {}", e);
                None
            }
        }
    }

    /// Typed write-through. Returns `false` on serialization failure,
    /// disabled state, or backend failure; never raises.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Option<Duration>) -> bool {
        if !self.is_enabled() {
            return false;
        }

        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                error!("Error serializing cache value for {}: {}", key, e);
                return false;
            }
        };

        let stored = self.remote.set_raw(key, &raw, ttl).await;
        if stored {
            let local_ttl = ttl.map_or(LOCAL_TTL, |ttl| ttl.min(LOCAL_TTL));
            self.local.set_raw(key, &raw, Some(local_ttl)).await;
        }
        stored
    }

    /// Delete from both tiers.
    pub async fn delete(&self, key: &str) -> bool {
        self.local.delete(key).await;
        self.remote.delete(key).await
    }

    pub async fn exists(&self, key: &str) -> bool {
        if !self.is_enabled() {
            return false;
        }
        self.local.exists(key).await || self.remote.exists(key).await
    }

    /// Enumerate remote keys; the remote keyspace is authoritative for
    /// invalidation. O(keyspace) — invalidation-time use only.
    pub async fn keys_matching(&self, pattern: &str) -> Vec<String> {
        self.remote.keys_matching(pattern).await
    }

    pub async fn key_count(&self) -> usize {
        self.remote.key_count().await
    }

    pub async fn memory_usage(&self) -> u64 {
        self.remote.memory_usage().await
    }
}
