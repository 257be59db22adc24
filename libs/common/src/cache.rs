//! In-memory TTL cache for upstream provider responses
//!
//! This module provides a small time-aware key/value store that the provider
//! clients use to reduce upstream call volume. Entries are never evicted by
//! size; they simply age past their TTL. A stale entry is still returned on
//! lookup so that callers can serve it as a degraded fallback when a refresh
//! attempt fails.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// TTL for fast-moving data (metadata details, search results, trailers)
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// TTL for slow-moving reference data (genre, country, and tag lists)
pub const REFERENCE_TTL: Duration = Duration::from_secs(3600);

/// Outcome of a cache lookup
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup<T> {
    /// Entry exists and its TTL has not elapsed
    Fresh(T),
    /// Entry exists but its TTL has elapsed; usable as a degraded fallback
    Stale(T),
    /// No entry has ever been stored under this key
    Miss,
}

#[derive(Debug)]
struct CacheSlot<T> {
    value: T,
    stored_at: Instant,
}

/// Time-aware in-memory cache
///
/// Single-process and lost on restart; this is a performance cache, not a
/// durability layer. Each provider client owns its own instance, injected at
/// construction.
#[derive(Debug, Clone)]
pub struct TtlCache<T> {
    ttl: Duration,
    entries: Arc<RwLock<HashMap<String, CacheSlot<T>>>>,
}

impl<T: Clone> TtlCache<T> {
    /// Create a cache whose entries stay fresh for `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Look up a key, reporting whether the entry is still fresh
    pub async fn get(&self, key: &str) -> CacheLookup<T> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(slot) if slot.stored_at.elapsed() < self.ttl => {
                CacheLookup::Fresh(slot.value.clone())
            }
            Some(slot) => CacheLookup::Stale(slot.value.clone()),
            None => CacheLookup::Miss,
        }
    }

    /// Store a value under a key, unconditionally overwriting any prior entry
    pub async fn set(&self, key: &str, value: T) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            CacheSlot {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Drop every entry
    pub async fn flush(&self) {
        let mut entries = self.entries.write().await;
        entries.clear();
    }

    /// Number of keys currently stored, fresh or stale
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// True when no keys are stored
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

/// Build a deterministic cache key from an operation name and its parameters
///
/// Parameters must already be in a canonical order; the same logical query
/// always maps to the same key.
pub fn cache_key(operation: &str, params: &[(&str, &str)]) -> String {
    let mut key = String::from(operation);
    for (name, value) in params {
        key.push(':');
        key.push_str(name);
        key.push('=');
        key.push_str(value);
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_after_set_is_fresh() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.set("k", 42u32).await;

        assert_eq!(cache.get("k").await, CacheLookup::Fresh(42));
    }

    #[tokio::test]
    async fn test_expired_entry_is_stale_not_miss() {
        let cache = TtlCache::new(Duration::from_millis(10));
        cache.set("k", "v".to_string()).await;

        tokio::time::sleep(Duration::from_millis(25)).await;

        assert_eq!(
            cache.get("k").await,
            CacheLookup::Stale("v".to_string()),
            "an aged entry must remain available as a fallback"
        );
    }

    #[tokio::test]
    async fn test_set_overwrites_and_restores_freshness() {
        let cache = TtlCache::new(Duration::from_millis(10));
        cache.set("k", 1u32).await;
        tokio::time::sleep(Duration::from_millis(25)).await;

        cache.set("k", 2u32).await;
        assert_eq!(cache.get("k").await, CacheLookup::Fresh(2));
    }

    #[tokio::test]
    async fn test_unknown_key_is_miss() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(60));
        assert_eq!(cache.get("unknown").await, CacheLookup::Miss);
    }

    #[tokio::test]
    async fn test_flush_and_len() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.set("a", 1u32).await;
        cache.set("b", 2u32).await;
        assert_eq!(cache.len().await, 2);

        cache.flush().await;
        assert_eq!(cache.len().await, 0);
        assert!(cache.is_empty().await);
        assert_eq!(cache.get("a").await, CacheLookup::Miss);
    }

    #[test]
    fn test_cache_key_is_deterministic() {
        let a = cache_key("search", &[("q", "jazz"), ("page", "1")]);
        let b = cache_key("search", &[("q", "jazz"), ("page", "1")]);
        assert_eq!(a, b);
        assert_eq!(a, "search:q=jazz:page=1");

        let c = cache_key("search", &[("q", "jazz"), ("page", "2")]);
        assert_ne!(a, c);
    }
}
