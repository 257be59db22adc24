//! Client for the video platform
//!
//! Used for one thing: finding an embeddable trailer for a movie or TV item
//! when the metadata provider returned none. Lookups are best-effort at the
//! resolution layer; this client still classifies its own failures like any
//! other adapter.

use crate::error::{ProviderError, ProviderResult};
use crate::http;
use crate::models::{Delivery, SourceProvider, StreamSource};
use common::cache::{self, TtlCache};
use serde::Deserialize;
use serde_json::Value;
use std::env;
use tracing::warn;

/// Default video platform API base URL
pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Embed URL prefix for returned video ids
pub const EMBED_BASE_URL: &str = "https://www.youtube.com/embed";

const USER_AGENT: &str = "medley/0.1 (video)";

/// Video platform configuration
#[derive(Debug, Clone)]
pub struct VideoConfig {
    pub base_url: String,
    /// Short API key sent as the platform's `key` query parameter
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl VideoConfig {
    /// Create a new VideoConfig from environment variables
    ///
    /// # Environment Variables
    /// - `VIDEO_API_URL`: API base URL (default: YouTube Data v3)
    /// - `VIDEO_API_KEY`: API key
    /// - `VIDEO_TIMEOUT_SECS`: request timeout (default: 15)
    pub fn from_env() -> Self {
        Self {
            base_url: env::var("VIDEO_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            api_key: env::var("VIDEO_API_KEY").ok(),
            timeout_secs: env::var("VIDEO_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(http::DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Raw search response from the platform
#[derive(Debug, Deserialize)]
pub struct SearchListPayload {
    #[serde(default)]
    pub items: Vec<SearchHitPayload>,
}

#[derive(Debug, Deserialize)]
pub struct SearchHitPayload {
    pub id: VideoIdPayload,
}

#[derive(Debug, Deserialize)]
pub struct VideoIdPayload {
    #[serde(rename = "videoId")]
    pub video_id: Option<String>,
}

/// Map the first usable search hit to an embeddable trailer source
///
/// Pure: no network access, no randomness.
pub fn trailer_source(payload: &SearchListPayload) -> Option<StreamSource> {
    let video_id = payload
        .items
        .iter()
        .find_map(|item| item.id.video_id.as_deref())?;

    Some(StreamSource {
        provider: SourceProvider::VideoPlatform,
        url: format!("{EMBED_BASE_URL}/{video_id}"),
        quality: None,
        delivery: Delivery::Embed,
        language: None,
        subtitles: Vec::new(),
        active: true,
    })
}

/// Build the search term a trailer lookup sends upstream
fn trailer_query(title: &str, year: Option<i32>) -> String {
    match year {
        Some(year) => format!("{title} {year} trailer"),
        None => format!("{title} trailer"),
    }
}

/// Video platform client
#[derive(Debug, Clone)]
pub struct VideoPlatformClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    cache: TtlCache<Value>,
}

impl VideoPlatformClient {
    pub fn new(config: &VideoConfig, cache: TtlCache<Value>) -> ProviderResult<Self> {
        let client = http::build_http_client(config.timeout_secs, USER_AGENT)?;
        if config.api_key.as_deref().map_or(true, str::is_empty) {
            warn!("video platform API key is not configured; trailer lookups will fail");
        }

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            cache,
        })
    }

    /// Look up an embeddable trailer by title and optional release year
    ///
    /// Returns `Ok(None)` when the platform has no matching video.
    pub async fn find_trailer(
        &self,
        title: &str,
        year: Option<i32>,
    ) -> ProviderResult<Option<StreamSource>> {
        let term = trailer_query(title, year);
        let key = cache::cache_key("trailer_search", &[("q", &term)]);

        let value = http::cached_fetch(&self.cache, &key, "trailer_search", || {
            self.request(&term)
        })
        .await?;

        let payload: SearchListPayload = serde_json::from_value(value)?;
        Ok(trailer_source(&payload))
    }

    /// Key count for the health endpoint
    pub async fn cache_entries(&self) -> usize {
        self.cache.len().await
    }

    async fn request(&self, term: &str) -> ProviderResult<Value> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            ProviderError::Configuration("video platform API key is missing".to_string())
        })?;

        let url = format!("{}/search", self.base_url);
        let params = [
            ("part", "snippet".to_string()),
            ("type", "video".to_string()),
            ("maxResults", "1".to_string()),
            ("q", term.to_string()),
            ("key", api_key.clone()),
        ];
        http::get_json(&self.client, &url, &params, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_trailer_source_maps_first_hit() {
        let payload: SearchListPayload = serde_json::from_value(json!({
            "items": [
                { "id": { "videoId": "dQw4w9WgXcQ" } },
                { "id": { "videoId": "another" } }
            ]
        }))
        .unwrap();

        let source = trailer_source(&payload).unwrap();
        assert_eq!(source.url, "https://www.youtube.com/embed/dQw4w9WgXcQ");
        assert_eq!(source.provider, SourceProvider::VideoPlatform);
        assert_eq!(source.delivery, Delivery::Embed);
        assert!(source.active);
        assert!(source.is_trailer());
    }

    #[test]
    fn test_trailer_source_skips_hits_without_video_id() {
        // Channel/playlist hits carry no videoId and must be skipped
        let payload: SearchListPayload = serde_json::from_value(json!({
            "items": [
                { "id": {} },
                { "id": { "videoId": "abc123" } }
            ]
        }))
        .unwrap();

        let source = trailer_source(&payload).unwrap();
        assert_eq!(source.url, "https://www.youtube.com/embed/abc123");
    }

    #[test]
    fn test_trailer_source_empty_results() {
        let payload: SearchListPayload = serde_json::from_value(json!({ "items": [] })).unwrap();
        assert!(trailer_source(&payload).is_none());
    }

    #[test]
    fn test_trailer_query_includes_year_when_known() {
        assert_eq!(
            trailer_query("The Matrix", Some(1999)),
            "The Matrix 1999 trailer"
        );
        assert_eq!(trailer_query("The Matrix", None), "The Matrix trailer");
    }
}
