// src/cache/invalidation.rs
// Domain-aware bulk invalidation. Every operation swallows backend errors and
// reports a zero/empty result: invalidation must never fail the write path
// that triggered it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::agents::TrendAgent;
use crate::cache::{cache_key, sanitize_segment, CacheDomain, CacheStore};
use crate::models::UserPreferences;

/// Styles pre-warmed when an admin does not name any.
const WARM_UP_STYLES: [&str; 4] = ["modern", "traditional", "scandinavian", "contemporary"];

#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub total_keys: usize,
    pub by_domain: HashMap<String, usize>,
    pub memory_usage: u64,
}

pub struct CacheInvalidationService {
    store: Arc<CacheStore>,
}

impl CacheInvalidationService {
    pub fn new(store: Arc<CacheStore>) -> Self {
        Self { store }
    }

    /// Remove every cache entry belonging to `user_id` in the given domains
    /// (default: all user-scoped domains). Idempotent; returns the number of
    /// keys removed.
    pub async fn invalidate_user(&self, user_id: &str, domains: Option<&[CacheDomain]>) -> usize {
        let default_domains: Vec<CacheDomain> = CacheDomain::ALL
            .iter()
            .copied()
            .filter(CacheDomain::is_user_scoped)
            .collect();
        let domains = domains.unwrap_or(&default_domains);

        let user = sanitize_segment(user_id);
        let mut invalidated = 0;
        for domain in domains {
            // The scan pattern is a substring match, so it also surfaces keys
            // of users whose id merely contains this one ("u1" vs "u12").
            // Only keys carrying the id as a whole segment belong to the user.
            let pattern = format!("{}:*{}*", domain.prefix(), user);
            for key in self.store.keys_matching(&pattern).await {
                if key_has_segment(&key, &user) && self.store.delete(&key).await {
                    invalidated += 1;
                }
            }
        }

        info!(user_id, invalidated, "Invalidated user cache entries");
        invalidated
    }

    /// Remove entries in `domain` whose embedded timestamp is older than
    /// `max_age`. Entries with a missing or unparsable timestamp are treated
    /// as stale and removed, not kept forever.
    pub async fn invalidate_stale(&self, domain: CacheDomain, max_age: Duration) -> usize {
        let pattern = format!("{}:*", domain.prefix());
        let keys = self.store.keys_matching(&pattern).await;
        let cutoff = Utc::now()
            - chrono::Duration::from_std(max_age).unwrap_or_else(|_| chrono::Duration::hours(6));

        let mut invalidated = 0;
        for key in keys {
            let stale = match self.store.get::<serde_json::Value>(&key).await {
                Some(value) => match entry_timestamp(&value) {
                    Some(ts) => ts < cutoff,
                    None => {
                        warn!(%key, "cache entry without parsable timestamp treated as stale");
                        true
                    }
                },
                // Unreadable entry: already gone or corrupt either way.
                None => true,
            };
            if stale && self.store.delete(&key).await {
                invalidated += 1;
            }
        }

        info!(domain = domain.prefix(), invalidated, "Invalidated stale cache entries");
        invalidated
    }

    /// Direct single-key removal — the fast path when the identifying
    /// arguments are known at call time. Preferred over pattern scans.
    pub async fn invalidate_exact(&self, domain: CacheDomain, args: &[&str]) -> bool {
        self.store.delete(&cache_key(domain, args)).await
    }

    /// Remove a whole-result room analysis along with its component entries.
    pub async fn invalidate_room_analysis(&self, image_hash: &str, user_id: &str) -> usize {
        let keys = [
            cache_key(CacheDomain::RoomAnalysis, &[image_hash, user_id]),
            cache_key(CacheDomain::StyleEmbeddings, &[image_hash]),
            cache_key(CacheDomain::ColorPalette, &[image_hash]),
        ];

        let mut invalidated = 0;
        for key in &keys {
            if self.store.delete(key).await {
                invalidated += 1;
            }
        }
        invalidated
    }

    /// Pre-populate trend entries for the styles a user is likely to hit, so
    /// the first requests after a cold start skip the trend stage. Failures
    /// are logged and skipped; returns the number of entries written.
    pub async fn warm_up(
        &self,
        user_id: &str,
        styles: Option<&[String]>,
        trend: &dyn TrendAgent,
    ) -> usize {
        let styles: Vec<String> = match styles {
            Some(list) => list.to_vec(),
            None => WARM_UP_STYLES.iter().map(|s| s.to_string()).collect(),
        };

        let mut warmed = 0;
        for style in &styles {
            let topic = format!("style_evolution_{style}");
            let key = cache_key(CacheDomain::TrendData, &[&topic]);
            if self.store.exists(&key).await {
                continue;
            }

            let preferences = UserPreferences {
                aesthetic_style: style.clone(),
                ..Default::default()
            };
            match trend.analyze_style_evolution(&preferences).await {
                Ok(insight) => {
                    let ttl = self.store.ttl_for(CacheDomain::TrendData);
                    if self.store.set(&key, &insight, Some(ttl)).await {
                        warmed += 1;
                    }
                }
                Err(e) => warn!(style = %style, "Skipping warm-up entry: {e}"),
            }
        }

        info!(user_id, warmed, "Warmed up cache entries");
        warmed
    }

    /// Keyspace diagnostics. Not for the request hot path.
    pub async fn stats(&self) -> CacheStats {
        let mut by_domain = HashMap::new();
        for domain in CacheDomain::ALL {
            let pattern = format!("{}:*", domain.prefix());
            let count = self.store.keys_matching(&pattern).await.len();
            by_domain.insert(domain.prefix().to_string(), count);
        }

        CacheStats {
            total_keys: self.store.key_count().await,
            by_domain,
            memory_usage: self.store.memory_usage().await,
        }
    }
}

/// A key owns an id only when the id spans a whole colon-delimited segment.
fn key_has_segment(key: &str, segment: &str) -> bool {
    key.split(':').skip(1).any(|part| part == segment)
}

fn entry_timestamp(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    let raw = value
        .get("timestamp")
        .or_else(|| value.get("created_at"))?
        .as_str()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}
