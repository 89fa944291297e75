// src/cache/redis_cache.rs

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::cache::CacheBackend;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Redis-backed remote cache tier.
///
/// Connection failure degrades to a disabled backend: every operation becomes
/// a no-op and the request pipeline keeps running without the speed benefit.
#[derive(Clone)]
pub struct RedisBackend {
    client: Option<ConnectionManager>,
    enabled: bool,
}

impl RedisBackend {
    /// Connect to Redis; returns a disabled backend instead of failing.
    pub async fn connect(url: &str) -> Self {
        let client = match redis::Client::open(url) {
            Ok(client) => client,
            Err(e) => {
                error!("Failed to open Redis client: {}", e);
                return Self::disabled();
            }
        };

        let manager = match tokio::time::timeout(CONNECT_TIMEOUT, ConnectionManager::new(client)).await {
            Ok(Ok(manager)) => manager,
            Ok(Err(e)) => {
                error!("Failed to create Redis connection manager: {}", e);
                return Self::disabled();
            }
            Err(_) => {
                error!("Redis connection timed out after {:?}", CONNECT_TIMEOUT);
                return Self::disabled();
            }
        };

        let mut conn = manager.clone();
        match redis::cmd("PING").query_async::<String>(&mut conn).await {
            Ok(_) => {
                info!("Redis cache connected");
                Self {
                    client: Some(manager),
                    enabled: true,
                }
            }
            Err(e) => {
                error!("Redis ping failed: {}", e);
                Self::disabled()
            }
        }
    }

    /// Disabled backend (cache outage fallback).
    pub fn disabled() -> Self {
        Self {
            client: None,
            enabled: false,
        }
    }

    fn conn(&self) -> Option<ConnectionManager> {
        if self.enabled {
            self.client.clone()
        } else {
            None
        }
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    fn is_enabled(&self) -> bool {
        self.enabled && self.client.is_some()
    }

    async fn get_raw(&self, key: &str) -> Option<String> {
        let mut conn = self.conn()?;
        match conn.get::<_, Option<String>>(key).await {
            Ok(value) => {
                debug!(key, hit = value.is_some(), "redis get");
                value
            }
            Err(e) => {
                error!("Error getting cache key {}: {}", key, e);
                None
            }
        }
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Option<Duration>) -> bool {
        let Some(mut conn) = self.conn() else {
            return false;
        };
        let result = match ttl {
            Some(ttl) => conn.set_ex::<_, _, ()>(key, value, ttl.as_secs()).await,
            None => conn.set::<_, _, ()>(key, value).await,
        };
        match result {
            Ok(()) => {
                debug!(key, "redis set");
                true
            }
            Err(e) => {
                error!("Error setting cache key {}: {}", key, e);
                false
            }
        }
    }

    async fn delete(&self, key: &str) -> bool {
        let Some(mut conn) = self.conn() else {
            return false;
        };
        match conn.del::<_, i64>(key).await {
            Ok(removed) => removed > 0,
            Err(e) => {
                error!("Error deleting cache key {}: {}", key, e);
                false
            }
        }
    }

    async fn exists(&self, key: &str) -> bool {
        let Some(mut conn) = self.conn() else {
            return false;
        };
        match conn.exists::<_, bool>(key).await {
            Ok(found) => found,
            Err(e) => {
                error!("Error checking cache key {}: {}", key, e);
                false
            }
        }
    }

    async fn keys_matching(&self, pattern: &str) -> Vec<String> {
        let Some(mut conn) = self.conn() else {
            return Vec::new();
        };
        // O(keyspace); invalidation-time only, never on the request hot path.
        match conn.keys::<_, Vec<String>>(pattern).await {
            Ok(keys) => keys,
            Err(e) => {
                error!("Error listing keys for pattern {}: {}", pattern, e);
                Vec::new()
            }
        }
    }

    async fn key_count(&self) -> usize {
        let Some(mut conn) = self.conn() else {
            return 0;
        };
        match redis::cmd("DBSIZE").query_async::<usize>(&mut conn).await {
            Ok(count) => count,
            Err(e) => {
                error!("Error getting key count: {}", e);
                0
            }
        }
    }

    async fn memory_usage(&self) -> u64 {
        let Some(mut conn) = self.conn() else {
            return 0;
        };
        let info: String = match redis::cmd("INFO")
            .arg("memory")
            .query_async::<String>(&mut conn)
            .await
        {
            Ok(info) => info,
            Err(e) => {
                error!("Error getting memory info: {}", e);
                return 0;
            }
        };
        info.lines()
            .find_map(|line| line.strip_prefix("used_memory:"))
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_backend_is_a_noop() {
        let backend = RedisBackend::disabled();
        assert!(!backend.is_enabled());
        assert!(!backend.set_raw("k", "v", None).await);
        assert_eq!(backend.get_raw("k").await, None);
        assert!(!backend.delete("k").await);
        assert!(!backend.exists("k").await);
        assert!(backend.keys_matching("*").await.is_empty());
        assert_eq!(backend.key_count().await, 0);
    }

    #[tokio::test]
    #[ignore]
    async fn live_redis_round_trip() {
        let backend = RedisBackend::connect("redis://127.0.0.1:6379/").await;
        assert!(backend.is_enabled());

        assert!(
            backend
                .set_raw("decor_test_key", "\"value\"", Some(Duration::from_secs(60)))
                .await
        );
        assert_eq!(
            backend.get_raw("decor_test_key").await.as_deref(),
            Some("\"value\"")
        );
        assert!(backend.delete("decor_test_key").await);
    }
}
