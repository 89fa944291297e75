// src/cache/mod.rs
// Caching layer: domain/TTL policy, key derivation, and the backend trait
// shared by the Redis and in-memory tiers.

pub mod invalidation;
pub mod memory_cache;
pub mod redis_cache;
pub mod store;

pub use invalidation::CacheInvalidationService;
pub use memory_cache::MemoryBackend;
pub use redis_cache::RedisBackend;
pub use store::CacheStore;

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

/// A named category of cached artifact. Each domain owns one TTL and one
/// invalidation pattern; ownership is process-wide and fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheDomain {
    RoomAnalysis,
    TrendData,
    ArtworkRecommendations,
    UserPreferences,
    StyleEmbeddings,
    ColorPalette,
    LocationData,
    SessionData,
}

impl CacheDomain {
    pub const ALL: [CacheDomain; 8] = [
        CacheDomain::RoomAnalysis,
        CacheDomain::TrendData,
        CacheDomain::ArtworkRecommendations,
        CacheDomain::UserPreferences,
        CacheDomain::StyleEmbeddings,
        CacheDomain::ColorPalette,
        CacheDomain::LocationData,
        CacheDomain::SessionData,
    ];

    pub fn prefix(&self) -> &'static str {
        match self {
            CacheDomain::RoomAnalysis => "room_analysis",
            CacheDomain::TrendData => "trend_data",
            CacheDomain::ArtworkRecommendations => "artwork_recommendations",
            CacheDomain::UserPreferences => "user_preferences",
            CacheDomain::StyleEmbeddings => "style_embeddings",
            CacheDomain::ColorPalette => "color_palette",
            CacheDomain::LocationData => "location_data",
            CacheDomain::SessionData => "session_data",
        }
    }

    pub fn default_ttl_secs(&self) -> u64 {
        match self {
            CacheDomain::RoomAnalysis => 3600,
            CacheDomain::TrendData => 1800,
            CacheDomain::ArtworkRecommendations => 7200,
            CacheDomain::UserPreferences => 86400,
            CacheDomain::StyleEmbeddings => 14400,
            CacheDomain::ColorPalette => 1800,
            CacheDomain::LocationData => 3600,
            CacheDomain::SessionData => 7200,
        }
    }

    /// Domains whose keys embed the owning user id, and therefore participate
    /// in user-scoped invalidation.
    pub fn is_user_scoped(&self) -> bool {
        matches!(
            self,
            CacheDomain::RoomAnalysis
                | CacheDomain::ArtworkRecommendations
                | CacheDomain::UserPreferences
                | CacheDomain::SessionData
        )
    }
}

/// Per-domain TTLs, resolved once at startup from the defaults plus optional
/// `TTL_<DOMAIN>` environment overrides (seconds).
#[derive(Debug, Clone)]
pub struct TtlTable {
    ttls: HashMap<CacheDomain, u64>,
}

impl TtlTable {
    pub fn with_defaults() -> Self {
        let ttls = CacheDomain::ALL
            .iter()
            .map(|d| (*d, d.default_ttl_secs()))
            .collect();
        Self { ttls }
    }

    pub fn from_env() -> Self {
        let mut table = Self::with_defaults();
        for domain in CacheDomain::ALL {
            let var = format!("TTL_{}", domain.prefix().to_uppercase());
            if let Ok(raw) = std::env::var(&var) {
                match raw.trim().parse::<u64>() {
                    Ok(secs) if secs > 0 => {
                        table.ttls.insert(domain, secs);
                    }
                    _ => tracing::warn!("Ignoring invalid {} value: {:?}", var, raw),
                }
            }
        }
        table
    }

    pub fn ttl_for(&self, domain: CacheDomain) -> Duration {
        let secs = self
            .ttls
            .get(&domain)
            .copied()
            .unwrap_or_else(|| domain.default_ttl_secs());
        Duration::from_secs(secs)
    }
}

/// Strip the key delimiter and wildcard from a key segment so distinct
/// argument tuples can never collide and patterns stay well-formed.
pub fn sanitize_segment(segment: &str) -> String {
    segment.replace([':', '*'], "-")
}

/// Canonical key derivation: transparent colon-delimited segments,
/// `prefix:arg1:arg2`. Transparent keys keep `prefix:*<user_id>*` pattern
/// invalidation possible; sanitized segments keep them collision-free.
pub fn cache_key(domain: CacheDomain, args: &[&str]) -> String {
    let mut key = String::from(domain.prefix());
    for arg in args {
        key.push(':');
        key.push_str(&sanitize_segment(arg));
    }
    key
}

/// Minimal glob matching (`*` wildcard only), mirroring the subset of Redis
/// KEYS patterns the invalidation service emits.
pub fn glob_match(pattern: &str, key: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == key;
    }
    let parts: Vec<&str> = pattern.split('*').collect();
    let mut pos = 0usize;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 {
            if !key.starts_with(part) {
                return false;
            }
            pos = part.len();
        } else if i == parts.len() - 1 {
            return key.len() >= pos && key[pos..].ends_with(part);
        } else {
            match key[pos..].find(part) {
                Some(found) => pos += found + part.len(),
                None => return false,
            }
        }
    }
    true
}

/// Raw string key-value operations shared by every cache tier. All failure
/// modes are absorbed: operations return `None`/`false`/empty, never error.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    fn is_enabled(&self) -> bool;
    async fn get_raw(&self, key: &str) -> Option<String>;
    async fn set_raw(&self, key: &str, value: &str, ttl: Option<Duration>) -> bool;
    async fn delete(&self, key: &str) -> bool;
    async fn exists(&self, key: &str) -> bool;
    async fn keys_matching(&self, pattern: &str) -> Vec<String>;
    async fn key_count(&self) -> usize;
    async fn memory_usage(&self) -> u64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_is_deterministic() {
        let a = cache_key(CacheDomain::RoomAnalysis, &["abc123", "u1"]);
        let b = cache_key(CacheDomain::RoomAnalysis, &["abc123", "u1"]);
        assert_eq!(a, b);
        assert_eq!(a, "room_analysis:abc123:u1");
    }

    #[test]
    fn cache_key_differs_for_different_args() {
        let a = cache_key(CacheDomain::ArtworkRecommendations, &["u1", "modern"]);
        let b = cache_key(CacheDomain::ArtworkRecommendations, &["u1", "rustic"]);
        let c = cache_key(CacheDomain::ArtworkRecommendations, &["u2", "modern"]);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn sanitize_prevents_delimiter_collisions() {
        // "a:b" + "c" and "a" + "b:c" must not produce the same key
        let a = cache_key(CacheDomain::LocationData, &["a:b", "c"]);
        let b = cache_key(CacheDomain::LocationData, &["a", "b:c"]);
        assert_ne!(a, b);
        assert!(!sanitize_segment("with*wildcard").contains('*'));
    }

    #[test]
    fn glob_match_basic_patterns() {
        assert!(glob_match("room_analysis:*", "room_analysis:abc:u1"));
        assert!(glob_match("*:u1:*", "artwork_recommendations:u1:modern"));
        assert!(glob_match("user_preferences:*u1*", "user_preferences:u1"));
        assert!(!glob_match("trend_data:*", "location_data:berlin"));
        assert!(glob_match("exact", "exact"));
        assert!(!glob_match("exact", "exact:more"));
    }

    #[test]
    fn ttl_table_env_override() {
        std::env::set_var("TTL_TREND_DATA", "42");
        let table = TtlTable::from_env();
        assert_eq!(table.ttl_for(CacheDomain::TrendData).as_secs(), 42);
        assert_eq!(table.ttl_for(CacheDomain::UserPreferences).as_secs(), 86400);
        std::env::remove_var("TTL_TREND_DATA");
    }
}
