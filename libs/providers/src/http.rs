//! Shared HTTP plumbing for the upstream provider clients
//!
//! Credential resolution, the fixed-timeout reqwest client, JSON GET with
//! status classification, and the cache-then-fetch policy every client
//! applies: serve fresh entries, refresh stale ones, and fall back to the
//! stale value when the refresh fails.

use crate::error::{ProviderError, ProviderResult};
use common::cache::{CacheLookup, TtlCache};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Default timeout applied to every outbound call, in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Credentials longer than this are treated as opaque bearer tokens
const BEARER_TOKEN_MIN_LEN: usize = 40;

/// How a provider credential is attached to outbound requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthScheme {
    /// Long opaque token sent as an `Authorization: Bearer` header
    Bearer(String),
    /// Short key sent as an `api_key` query parameter
    QueryKey(String),
}

impl AuthScheme {
    /// Classify a configured credential, if any
    ///
    /// Resolved once at client construction. An empty or missing credential
    /// yields `None`, in which case the client fails every call with a
    /// configuration error.
    pub fn resolve(credential: Option<&str>) -> Option<Self> {
        let credential = credential?.trim();
        if credential.is_empty() {
            None
        } else if credential.len() > BEARER_TOKEN_MIN_LEN {
            Some(Self::Bearer(credential.to_string()))
        } else {
            Some(Self::QueryKey(credential.to_string()))
        }
    }
}

/// Build a reqwest client carrying the fixed per-request timeout
pub fn build_http_client(timeout_secs: u64, user_agent: &str) -> ProviderResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(user_agent)
        .build()
        .map_err(ProviderError::Transport)
}

/// Issue a GET request and decode the JSON body
///
/// Non-2xx statuses are classified before any decoding is attempted.
pub async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    query: &[(&str, String)],
    auth: Option<&AuthScheme>,
) -> ProviderResult<T> {
    let mut request = client.get(url).query(query);
    match auth {
        Some(AuthScheme::Bearer(token)) => request = request.bearer_auth(token),
        Some(AuthScheme::QueryKey(key)) => {
            request = request.query(&[("api_key", key.as_str())]);
        }
        None => {}
    }

    let response = request.send().await.map_err(ProviderError::from)?;
    let status = response.status();
    if !status.is_success() {
        return Err(ProviderError::from_status(status));
    }

    response.json::<T>().await.map_err(ProviderError::from)
}

/// Serve from cache, refreshing when the entry is stale or missing
///
/// A stale entry is returned as a degraded fallback when the refresh fails;
/// only a never-cached key propagates the failure to the caller.
pub async fn cached_fetch<T, F, Fut>(
    cache: &TtlCache<T>,
    key: &str,
    operation: &str,
    fetch: F,
) -> ProviderResult<T>
where
    T: Clone,
    F: FnOnce() -> Fut,
    Fut: Future<Output = ProviderResult<T>>,
{
    let stale = match cache.get(key).await {
        CacheLookup::Fresh(value) => return Ok(value),
        CacheLookup::Stale(value) => Some(value),
        CacheLookup::Miss => None,
    };

    match fetch().await {
        Ok(value) => {
            cache.set(key, value.clone()).await;
            Ok(value)
        }
        Err(err) => match stale {
            Some(value) => {
                warn!(
                    operation,
                    error = %err,
                    "serving stale cached payload after refresh failure"
                );
                Ok(value)
            }
            None => Err(err),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_scheme_resolution() {
        assert_eq!(AuthScheme::resolve(None), None);
        assert_eq!(AuthScheme::resolve(Some("")), None);
        assert_eq!(AuthScheme::resolve(Some("   ")), None);

        assert_eq!(
            AuthScheme::resolve(Some("abcd1234")),
            Some(AuthScheme::QueryKey("abcd1234".to_string()))
        );

        let token = "t".repeat(64);
        assert_eq!(
            AuthScheme::resolve(Some(&token)),
            Some(AuthScheme::Bearer(token.clone()))
        );
    }

    #[tokio::test]
    async fn test_cached_fetch_serves_fresh_without_calling_upstream() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.set("k", 1u32).await;

        let value = cached_fetch(&cache, "k", "op", || async {
            panic!("upstream must not be called for a fresh entry")
        })
        .await
        .unwrap();
        assert_eq!(value, 1);
    }

    #[tokio::test]
    async fn test_cached_fetch_falls_back_to_stale_on_failure() {
        let cache = TtlCache::new(Duration::from_millis(10));
        cache.set("k", 1u32).await;
        tokio::time::sleep(Duration::from_millis(25)).await;

        let value = cached_fetch(&cache, "k", "op", || async {
            Err(ProviderError::Timeout)
        })
        .await
        .unwrap();
        assert_eq!(value, 1, "stale value must be served when the refresh fails");
    }

    #[tokio::test]
    async fn test_cached_fetch_refreshes_stale_entry() {
        let cache = TtlCache::new(Duration::from_millis(10));
        cache.set("k", 1u32).await;
        tokio::time::sleep(Duration::from_millis(25)).await;

        let value = cached_fetch(&cache, "k", "op", || async { Ok(2u32) })
            .await
            .unwrap();
        assert_eq!(value, 2);
        assert_eq!(cache.get("k").await, CacheLookup::Fresh(2));
    }

    #[tokio::test]
    async fn test_cached_fetch_propagates_failure_on_cold_key() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(60));

        let result = cached_fetch(&cache, "cold", "op", || async {
            Err(ProviderError::RateLimited)
        })
        .await;
        assert!(matches!(result, Err(ProviderError::RateLimited)));
    }
}
