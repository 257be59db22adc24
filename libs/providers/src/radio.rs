//! Client for the internet radio directory
//!
//! Wraps a radio-browser compatible API: station text search, tag and
//! country reference lists, station lookup by id, and the click endpoint the
//! directory uses for popularity tracking. The directory requires no
//! credential, only an identifying User-Agent.

use crate::error::ProviderResult;
use crate::http;
use crate::models::RadioStationRecord;
use common::cache::{self, TtlCache};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::env;

/// Default radio directory base URL
pub const DEFAULT_BASE_URL: &str = "https://de1.api.radio-browser.info/json";

/// The directory asks clients to identify themselves
const USER_AGENT: &str = "medley/0.1 (radio)";

/// Radio directory configuration
#[derive(Debug, Clone)]
pub struct RadioConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl RadioConfig {
    /// Create a new RadioConfig from environment variables
    ///
    /// # Environment Variables
    /// - `RADIO_API_URL`: directory base URL (default: radio-browser mirror)
    /// - `RADIO_TIMEOUT_SECS`: request timeout (default: 15)
    pub fn from_env() -> Self {
        Self {
            base_url: env::var("RADIO_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            timeout_secs: env::var("RADIO_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(http::DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Raw station payload as returned by the directory
#[derive(Debug, Clone, Deserialize)]
pub struct StationPayload {
    pub stationuuid: String,
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub url_resolved: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub bitrate: u32,
    #[serde(default)]
    pub codec: String,
    #[serde(default)]
    pub clickcount: u64,
    #[serde(default)]
    pub votes: u64,
}

/// One entry of the tag/country reference lists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameCount {
    pub name: String,
    #[serde(rename = "stationcount")]
    pub station_count: u64,
}

/// Map a raw directory payload to the internal station record
///
/// Pure: the directory reports tags as a comma-joined string and may leave
/// `url_resolved` empty, in which case the raw `url` is the stream URL.
pub fn normalize_station(payload: &StationPayload) -> RadioStationRecord {
    let stream_url = if payload.url_resolved.is_empty() {
        payload.url.clone()
    } else {
        payload.url_resolved.clone()
    };

    RadioStationRecord {
        station_id: payload.stationuuid.clone(),
        name: payload.name.clone(),
        stream_url,
        tags: payload
            .tags
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(String::from)
            .collect(),
        country: non_empty(&payload.country),
        bitrate: payload.bitrate,
        codec: non_empty(&payload.codec),
        click_count: payload.clickcount,
        listener_count: payload.votes,
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() { None } else { Some(s.to_string()) }
}

/// Radio directory client
///
/// Carries two injected caches: a short-lived one for station lookups and a
/// long-lived one for the tag/country reference lists. Both are exposed for
/// health-check introspection and can be flushed explicitly.
#[derive(Debug, Clone)]
pub struct RadioDirectoryClient {
    client: reqwest::Client,
    base_url: String,
    cache: TtlCache<Value>,
    reference_cache: TtlCache<Value>,
}

impl RadioDirectoryClient {
    pub fn new(
        config: &RadioConfig,
        cache: TtlCache<Value>,
        reference_cache: TtlCache<Value>,
    ) -> ProviderResult<Self> {
        let client = http::build_http_client(config.timeout_secs, USER_AGENT)?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cache,
            reference_cache,
        })
    }

    /// Free-text station search, most-voted first
    pub async fn search_stations(
        &self,
        query: &str,
        limit: u32,
    ) -> ProviderResult<Vec<RadioStationRecord>> {
        let params = [
            ("name", query.to_string()),
            ("limit", limit.to_string()),
            ("hidebroken", "true".to_string()),
            ("order", "votes".to_string()),
            ("reverse", "true".to_string()),
        ];
        self.station_list("station_search", "/stations/search", &params)
            .await
    }

    /// Stations carrying a given tag, most-voted first
    pub async fn stations_by_tag(
        &self,
        tag: &str,
        limit: u32,
    ) -> ProviderResult<Vec<RadioStationRecord>> {
        let params = [
            ("tag", tag.to_string()),
            ("limit", limit.to_string()),
            ("hidebroken", "true".to_string()),
            ("order", "votes".to_string()),
            ("reverse", "true".to_string()),
        ];
        self.station_list("stations_by_tag", "/stations/search", &params)
            .await
    }

    /// Look up one station by its directory id
    ///
    /// Returns `Ok(None)` when the directory confirms the id is unknown.
    pub async fn station_by_id(&self, uuid: &str) -> ProviderResult<Option<RadioStationRecord>> {
        let key = cache::cache_key("station_by_id", &[("uuid", uuid)]);
        let url = format!("{}/stations/byuuid/{uuid}", self.base_url);

        let value = http::cached_fetch(&self.cache, &key, "station_by_id", || {
            http::get_json(&self.client, &url, &[], None)
        })
        .await?;

        let payloads: Vec<StationPayload> = serde_json::from_value(value)?;
        Ok(payloads.first().map(normalize_station))
    }

    /// Report a listen to the directory's click endpoint
    ///
    /// Popularity tracking only; call sites treat failures as non-fatal.
    pub async fn click(&self, uuid: &str) -> ProviderResult<()> {
        let url = format!("{}/url/{}", self.base_url, uuid);
        http::get_json::<Value>(&self.client, &url, &[], None)
            .await
            .map(|_| ())
    }

    /// Tag reference list (long-lived cache)
    pub async fn tags(&self, limit: u32) -> ProviderResult<Vec<NameCount>> {
        let params = [
            ("limit", limit.to_string()),
            ("order", "stationcount".to_string()),
            ("reverse", "true".to_string()),
        ];
        self.reference_list("tags", "/tags", &params).await
    }

    /// Country reference list (long-lived cache)
    pub async fn countries(&self) -> ProviderResult<Vec<NameCount>> {
        self.reference_list("countries", "/countries", &[]).await
    }

    /// Key count across both caches, for the health endpoint
    pub async fn cache_entries(&self) -> usize {
        self.cache.len().await + self.reference_cache.len().await
    }

    /// Drop every cached directory response
    pub async fn flush_cache(&self) {
        self.cache.flush().await;
        self.reference_cache.flush().await;
    }

    async fn station_list(
        &self,
        operation: &str,
        path: &str,
        params: &[(&str, String)],
    ) -> ProviderResult<Vec<RadioStationRecord>> {
        let key_params: Vec<(&str, &str)> =
            params.iter().map(|(k, v)| (*k, v.as_str())).collect();
        let key = cache::cache_key(operation, &key_params);
        let url = format!("{}{}", self.base_url, path);

        let value = http::cached_fetch(&self.cache, &key, operation, || {
            http::get_json(&self.client, &url, params, None)
        })
        .await?;

        let payloads: Vec<StationPayload> = serde_json::from_value(value)?;
        Ok(payloads.iter().map(normalize_station).collect())
    }

    async fn reference_list(
        &self,
        operation: &str,
        path: &str,
        params: &[(&str, String)],
    ) -> ProviderResult<Vec<NameCount>> {
        let key_params: Vec<(&str, &str)> =
            params.iter().map(|(k, v)| (*k, v.as_str())).collect();
        let key = cache::cache_key(operation, &key_params);
        let url = format!("{}{}", self.base_url, path);

        let value = http::cached_fetch(&self.reference_cache, &key, operation, || {
            http::get_json(&self.client, &url, params, None)
        })
        .await?;

        let entries: Vec<NameCount> = serde_json::from_value(value)?;
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn station_payload() -> StationPayload {
        serde_json::from_value(json!({
            "stationuuid": "9617a958-0601-11e8-ae97-52543be04c81",
            "name": "FIP",
            "url": "http://direct.example.org/fip.mp3",
            "url_resolved": "https://icecast.example.org/fip-hifi.aac",
            "tags": "jazz, eclectic,  ,world",
            "country": "France",
            "bitrate": 192,
            "codec": "AAC",
            "clickcount": 1534,
            "votes": 4821
        }))
        .unwrap()
    }

    #[test]
    fn test_normalize_station_is_deterministic() {
        let payload = station_payload();
        assert_eq!(normalize_station(&payload), normalize_station(&payload));
    }

    #[test]
    fn test_normalize_station_field_mapping() {
        let record = normalize_station(&station_payload());

        assert_eq!(record.station_id, "9617a958-0601-11e8-ae97-52543be04c81");
        assert_eq!(record.stream_url, "https://icecast.example.org/fip-hifi.aac");
        assert_eq!(record.tags, vec!["jazz", "eclectic", "world"]);
        assert_eq!(record.country.as_deref(), Some("France"));
        assert_eq!(record.bitrate, 192);
        assert_eq!(record.listener_count, 4821);
        assert_eq!(record.click_count, 1534);
        assert_eq!(record.popularity(), 4821.0);
    }

    #[test]
    fn test_normalize_station_falls_back_to_raw_url() {
        let payload: StationPayload = serde_json::from_value(json!({
            "stationuuid": "u1",
            "name": "Some Station",
            "url": "http://direct.example.org/stream"
        }))
        .unwrap();

        let record = normalize_station(&payload);
        assert_eq!(record.stream_url, "http://direct.example.org/stream");
        assert!(record.tags.is_empty());
        assert_eq!(record.country, None);
        assert_eq!(record.codec, None);
    }

    #[test]
    fn test_name_count_deserializes_directory_shape() {
        let entry: NameCount =
            serde_json::from_value(json!({ "name": "jazz", "stationcount": 2048 })).unwrap();
        assert_eq!(entry.name, "jazz");
        assert_eq!(entry.station_count, 2048);
    }
}
