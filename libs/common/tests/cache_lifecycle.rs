//! Integration tests for the shared TTL cache
//!
//! These tests verify the full lifecycle a provider client drives the cache
//! through: populate, serve fresh, age out, serve stale as a fallback, and
//! overwrite on a successful refresh.

use common::cache::{CacheLookup, TtlCache, cache_key};
use std::time::Duration;

#[tokio::test]
async fn test_cache_lifecycle() {
    let cache = TtlCache::new(Duration::from_millis(40));
    let key = cache_key("movie_details", &[("id", "603")]);

    // Cold cache: nothing to serve
    assert_eq!(cache.get(&key).await, CacheLookup::Miss);

    // A successful upstream call populates the entry
    cache.set(&key, "the-matrix".to_string()).await;
    assert_eq!(
        cache.get(&key).await,
        CacheLookup::Fresh("the-matrix".to_string())
    );

    // Past the TTL the value must still be served, marked stale
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(
        cache.get(&key).await,
        CacheLookup::Stale("the-matrix".to_string())
    );

    // A refresh overwrites the entry and resets its age
    cache.set(&key, "the-matrix-reloaded".to_string()).await;
    assert_eq!(
        cache.get(&key).await,
        CacheLookup::Fresh("the-matrix-reloaded".to_string())
    );
}

#[tokio::test]
async fn test_flush_supports_health_introspection() {
    let cache = TtlCache::new(Duration::from_secs(60));
    cache.set(&cache_key("tags", &[]), vec!["jazz".to_string()]).await;
    cache
        .set(&cache_key("countries", &[]), vec!["France".to_string()])
        .await;

    assert_eq!(cache.len().await, 2);

    cache.flush().await;
    assert!(cache.is_empty().await);
}
