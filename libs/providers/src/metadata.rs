//! Client for the movie/TV metadata provider
//!
//! Wraps a TMDB-compatible REST API: details lookups, multi search, and the
//! category/discovery lists behind `listCategory`. Raw payloads are mapped
//! into `NormalizedItem` by pure transformation functions so the mapping can
//! be tested without any network access.

use crate::error::{ProviderError, ProviderResult};
use crate::http::{self, AuthScheme};
use crate::models::{MediaKind, NormalizedItem};
use common::cache::{self, TtlCache};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::env;
use tracing::warn;

/// Default metadata API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";

/// Default image CDN prefix prepended to poster/backdrop paths
pub const DEFAULT_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";

const USER_AGENT: &str = "medley/0.1 (metadata)";

/// Metadata provider configuration
#[derive(Debug, Clone)]
pub struct MetadataConfig {
    pub base_url: String,
    pub image_base_url: String,
    /// Bearer token or short API key; resolved once at client construction
    pub credential: Option<String>,
    pub timeout_secs: u64,
}

impl MetadataConfig {
    /// Create a new MetadataConfig from environment variables
    ///
    /// # Environment Variables
    /// - `METADATA_API_URL`: API base URL (default: TMDB v3)
    /// - `METADATA_IMAGE_URL`: image CDN prefix (default: TMDB CDN)
    /// - `METADATA_API_KEY`: bearer token or short API key
    /// - `METADATA_TIMEOUT_SECS`: request timeout (default: 15)
    pub fn from_env() -> Self {
        Self {
            base_url: env::var("METADATA_API_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            image_base_url: env::var("METADATA_IMAGE_URL")
                .unwrap_or_else(|_| DEFAULT_IMAGE_BASE_URL.to_string()),
            credential: env::var("METADATA_API_KEY").ok(),
            timeout_secs: env::var("METADATA_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(http::DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Operations the metadata provider knows how to serve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataOp {
    MovieDetails,
    TvDetails,
    SearchMulti,
    PopularMovies,
    TopRatedMovies,
    NowPlayingMovies,
    UpcomingMovies,
    Trending,
    OnTheAirTv,
    MovieGenres,
}

impl MetadataOp {
    /// Stable name used for cache keys and log lines
    pub fn name(&self) -> &'static str {
        match self {
            Self::MovieDetails => "movie_details",
            Self::TvDetails => "tv_details",
            Self::SearchMulti => "search_multi",
            Self::PopularMovies => "popular_movies",
            Self::TopRatedMovies => "top_rated_movies",
            Self::NowPlayingMovies => "now_playing_movies",
            Self::UpcomingMovies => "upcoming_movies",
            Self::Trending => "trending",
            Self::OnTheAirTv => "on_the_air_tv",
            Self::MovieGenres => "movie_genres",
        }
    }

    /// Upstream path for this operation; detail paths interpolate the id
    fn path(&self, id: Option<&str>) -> String {
        let id = id.unwrap_or_default();
        match self {
            Self::MovieDetails => format!("/movie/{id}"),
            Self::TvDetails => format!("/tv/{id}"),
            Self::SearchMulti => "/search/multi".to_string(),
            Self::PopularMovies => "/movie/popular".to_string(),
            Self::TopRatedMovies => "/movie/top_rated".to_string(),
            Self::NowPlayingMovies => "/movie/now_playing".to_string(),
            Self::UpcomingMovies => "/movie/upcoming".to_string(),
            Self::Trending => "/trending/all/week".to_string(),
            Self::OnTheAirTv => "/tv/on_the_air".to_string(),
            Self::MovieGenres => "/genre/movie/list".to_string(),
        }
    }

    /// Genre lists change rarely and use the long-lived reference cache
    fn is_reference(&self) -> bool {
        matches!(self, Self::MovieGenres)
    }
}

/// Discovery categories exposed through the category listing operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Popular,
    TopRated,
    Trending,
    NowPlaying,
    Upcoming,
    OnTheAir,
}

impl Category {
    /// Parse a category name from the route layer; unknown names are rejected
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "popular" => Some(Self::Popular),
            "top-rated" => Some(Self::TopRated),
            "trending" => Some(Self::Trending),
            "now-playing" => Some(Self::NowPlaying),
            "upcoming" => Some(Self::Upcoming),
            "on-the-air" => Some(Self::OnTheAir),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Popular => "popular",
            Self::TopRated => "top-rated",
            Self::Trending => "trending",
            Self::NowPlaying => "now-playing",
            Self::Upcoming => "upcoming",
            Self::OnTheAir => "on-the-air",
        }
    }

    fn op(&self) -> MetadataOp {
        match self {
            Self::Popular => MetadataOp::PopularMovies,
            Self::TopRated => MetadataOp::TopRatedMovies,
            Self::Trending => MetadataOp::Trending,
            Self::NowPlaying => MetadataOp::NowPlayingMovies,
            Self::Upcoming => MetadataOp::UpcomingMovies,
            Self::OnTheAir => MetadataOp::OnTheAirTv,
        }
    }
}

/// Raw movie payload as returned by the provider
#[derive(Debug, Clone, Deserialize)]
pub struct MoviePayload {
    pub id: i64,
    pub title: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub vote_average: f64,
    pub release_date: Option<String>,
    pub overview: Option<String>,
}

/// Raw TV payload as returned by the provider
#[derive(Debug, Clone, Deserialize)]
pub struct TvPayload {
    pub id: i64,
    pub name: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub vote_average: f64,
    pub first_air_date: Option<String>,
    pub overview: Option<String>,
}

/// Paged list wrapper shared by search and discovery endpoints
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct PagePayload<T> {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default)]
    pub results: Vec<T>,
}

fn default_page() -> u32 {
    1
}

/// One hit from the multi-search endpoint; `media_type` tags the shape
#[derive(Debug, Deserialize)]
pub struct MultiHitPayload {
    pub media_type: Option<String>,
    #[serde(flatten)]
    pub fields: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct GenreListPayload {
    genres: Vec<Genre>,
}

/// Map a raw movie payload to the provider-agnostic item shape
///
/// Pure and deterministic: the same payload always yields the same item.
pub fn normalize_movie(payload: &MoviePayload, image_base: &str) -> NormalizedItem {
    NormalizedItem {
        external_id: payload.id.to_string(),
        title: payload.title.clone(),
        kind: MediaKind::Movie,
        poster: payload
            .poster_path
            .as_deref()
            .map(|path| join_image_url(image_base, path)),
        backdrop: payload
            .backdrop_path
            .as_deref()
            .map(|path| join_image_url(image_base, path)),
        popularity: payload.popularity,
        rating: payload.vote_average,
        year: payload.release_date.as_deref().and_then(parse_year),
        overview: non_empty(payload.overview.as_deref()),
        sources: Vec::new(),
    }
}

/// Map a raw TV payload to the provider-agnostic item shape
pub fn normalize_tv(payload: &TvPayload, image_base: &str) -> NormalizedItem {
    NormalizedItem {
        external_id: payload.id.to_string(),
        title: payload.name.clone(),
        kind: MediaKind::Tv,
        poster: payload
            .poster_path
            .as_deref()
            .map(|path| join_image_url(image_base, path)),
        backdrop: payload
            .backdrop_path
            .as_deref()
            .map(|path| join_image_url(image_base, path)),
        popularity: payload.popularity,
        rating: payload.vote_average,
        year: payload.first_air_date.as_deref().and_then(parse_year),
        overview: non_empty(payload.overview.as_deref()),
        sources: Vec::new(),
    }
}

/// Split multi-search hits into typed movie/TV items
///
/// Person hits are not content and are dropped; a hit whose tagged shape
/// fails to parse is dropped rather than failing the whole list.
pub fn normalize_multi(hits: Vec<MultiHitPayload>, image_base: &str) -> Vec<NormalizedItem> {
    hits.into_iter()
        .filter_map(|hit| match hit.media_type.as_deref() {
            Some("movie") => serde_json::from_value::<MoviePayload>(hit.fields)
                .ok()
                .map(|payload| normalize_movie(&payload, image_base)),
            Some("tv") => serde_json::from_value::<TvPayload>(hit.fields)
                .ok()
                .map(|payload| normalize_tv(&payload, image_base)),
            _ => None,
        })
        .collect()
}

fn parse_year(date: &str) -> Option<i32> {
    date.get(..4)?.parse().ok()
}

fn join_image_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Metadata provider client
///
/// Owns its HTTP connection pool and two injected caches: one for
/// fast-moving lookups (details, search, lists) and one for slow-moving
/// reference data (genres).
#[derive(Debug, Clone)]
pub struct MetadataClient {
    client: reqwest::Client,
    base_url: String,
    image_base_url: String,
    auth: Option<AuthScheme>,
    cache: TtlCache<Value>,
    reference_cache: TtlCache<Value>,
}

impl MetadataClient {
    /// Create a new client; the credential is classified here, once
    pub fn new(
        config: &MetadataConfig,
        cache: TtlCache<Value>,
        reference_cache: TtlCache<Value>,
    ) -> ProviderResult<Self> {
        let client = http::build_http_client(config.timeout_secs, USER_AGENT)?;
        let auth = AuthScheme::resolve(config.credential.as_deref());
        if auth.is_none() {
            warn!("metadata provider credential is not configured; every call will fail");
        }

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            image_base_url: config.image_base_url.clone(),
            auth,
            cache,
            reference_cache,
        })
    }

    /// Full movie details, normalized
    pub async fn movie_details(&self, id: &str) -> ProviderResult<NormalizedItem> {
        let value = self.fetch(MetadataOp::MovieDetails, Some(id), &[]).await?;
        let payload: MoviePayload = serde_json::from_value(value)?;
        Ok(normalize_movie(&payload, &self.image_base_url))
    }

    /// Full TV details, normalized
    pub async fn tv_details(&self, id: &str) -> ProviderResult<NormalizedItem> {
        let value = self.fetch(MetadataOp::TvDetails, Some(id), &[]).await?;
        let payload: TvPayload = serde_json::from_value(value)?;
        Ok(normalize_tv(&payload, &self.image_base_url))
    }

    /// Free-text search across movies and TV
    pub async fn search(&self, query: &str, page: u32) -> ProviderResult<Vec<NormalizedItem>> {
        let params = [
            ("query", query.to_string()),
            ("page", page.max(1).to_string()),
        ];
        let value = self.fetch(MetadataOp::SearchMulti, None, &params).await?;
        let payload: PagePayload<MultiHitPayload> = serde_json::from_value(value)?;
        Ok(normalize_multi(payload.results, &self.image_base_url))
    }

    /// One discovery list page, normalized
    pub async fn list_category(
        &self,
        category: Category,
        page: u32,
    ) -> ProviderResult<Vec<NormalizedItem>> {
        let params = [("page", page.max(1).to_string())];
        let value = self.fetch(category.op(), None, &params).await?;

        let items = match category {
            Category::Trending => {
                let payload: PagePayload<MultiHitPayload> = serde_json::from_value(value)?;
                normalize_multi(payload.results, &self.image_base_url)
            }
            Category::OnTheAir => {
                let payload: PagePayload<TvPayload> = serde_json::from_value(value)?;
                payload
                    .results
                    .iter()
                    .map(|p| normalize_tv(p, &self.image_base_url))
                    .collect()
            }
            _ => {
                let payload: PagePayload<MoviePayload> = serde_json::from_value(value)?;
                payload
                    .results
                    .iter()
                    .map(|p| normalize_movie(p, &self.image_base_url))
                    .collect()
            }
        };
        Ok(items)
    }

    /// Genre reference list (long-lived cache)
    pub async fn genres(&self) -> ProviderResult<Vec<Genre>> {
        let value = self.fetch(MetadataOp::MovieGenres, None, &[]).await?;
        let payload: GenreListPayload = serde_json::from_value(value)?;
        Ok(payload.genres)
    }

    /// Key count across both caches, for the health endpoint
    pub async fn cache_entries(&self) -> usize {
        self.cache.len().await + self.reference_cache.len().await
    }

    /// Fetch one operation's payload, consulting the cache first
    async fn fetch(
        &self,
        op: MetadataOp,
        id: Option<&str>,
        params: &[(&str, String)],
    ) -> ProviderResult<Value> {
        let mut key_params: Vec<(&str, &str)> = Vec::with_capacity(params.len() + 1);
        if let Some(id) = id {
            key_params.push(("id", id));
        }
        key_params.extend(params.iter().map(|(k, v)| (*k, v.as_str())));
        let key = cache::cache_key(op.name(), &key_params);

        let cache = if op.is_reference() {
            &self.reference_cache
        } else {
            &self.cache
        };

        http::cached_fetch(cache, &key, op.name(), || self.request(op, id, params)).await
    }

    async fn request(
        &self,
        op: MetadataOp,
        id: Option<&str>,
        params: &[(&str, String)],
    ) -> ProviderResult<Value> {
        let auth = self.auth.as_ref().ok_or_else(|| {
            ProviderError::Configuration("metadata provider API key is missing".to_string())
        })?;
        let url = format!("{}{}", self.base_url, op.path(id));
        http::get_json(&self.client, &url, params, Some(auth)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn movie_payload() -> MoviePayload {
        serde_json::from_value(json!({
            "id": 603,
            "title": "The Matrix",
            "poster_path": "/matrix.jpg",
            "backdrop_path": "/matrix-backdrop.jpg",
            "popularity": 83.5,
            "vote_average": 8.2,
            "release_date": "1999-03-30",
            "overview": "A computer hacker learns the truth."
        }))
        .unwrap()
    }

    #[test]
    fn test_normalize_movie_is_pure_and_deterministic() {
        let payload = movie_payload();
        let first = normalize_movie(&payload, DEFAULT_IMAGE_BASE_URL);
        let second = normalize_movie(&payload, DEFAULT_IMAGE_BASE_URL);
        assert_eq!(first, second);
    }

    #[test]
    fn test_normalize_movie_field_mapping() {
        let item = normalize_movie(&movie_payload(), DEFAULT_IMAGE_BASE_URL);

        assert_eq!(item.external_id, "603");
        assert_eq!(item.title, "The Matrix");
        assert_eq!(item.kind, MediaKind::Movie);
        assert_eq!(
            item.poster.as_deref(),
            Some("https://image.tmdb.org/t/p/w500/matrix.jpg")
        );
        assert_eq!(item.rating, 8.2);
        assert_eq!(item.year, Some(1999));
        assert!(item.sources.is_empty());
    }

    #[test]
    fn test_normalize_movie_tolerates_missing_optionals() {
        let payload: MoviePayload = serde_json::from_value(json!({
            "id": 1,
            "title": "Untitled",
            "release_date": "",
            "overview": "  "
        }))
        .unwrap();

        let item = normalize_movie(&payload, DEFAULT_IMAGE_BASE_URL);
        assert_eq!(item.year, None);
        assert_eq!(item.overview, None);
        assert_eq!(item.poster, None);
        assert_eq!(item.rating, 0.0);
    }

    #[test]
    fn test_payload_without_title_is_rejected() {
        let result = serde_json::from_value::<MoviePayload>(json!({ "id": 1 }));
        assert!(result.is_err(), "shape mismatches must be rejected, not coerced");
    }

    #[test]
    fn test_normalize_tv_uses_first_air_date() {
        let payload: TvPayload = serde_json::from_value(json!({
            "id": 1399,
            "name": "Game of Thrones",
            "first_air_date": "2011-04-17",
            "vote_average": 8.4
        }))
        .unwrap();

        let item = normalize_tv(&payload, DEFAULT_IMAGE_BASE_URL);
        assert_eq!(item.kind, MediaKind::Tv);
        assert_eq!(item.year, Some(2011));
        assert_eq!(item.title, "Game of Thrones");
    }

    #[test]
    fn test_normalize_multi_keeps_only_content_hits() {
        let hits: PagePayload<MultiHitPayload> = serde_json::from_value(json!({
            "page": 1,
            "results": [
                { "media_type": "movie", "id": 603, "title": "The Matrix" },
                { "media_type": "tv", "id": 1399, "name": "Game of Thrones" },
                { "media_type": "person", "id": 6384, "name": "Keanu Reeves" },
                { "media_type": "movie", "id": 99 }
            ]
        }))
        .unwrap();

        let items = normalize_multi(hits.results, DEFAULT_IMAGE_BASE_URL);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].kind, MediaKind::Movie);
        assert_eq!(items[1].kind, MediaKind::Tv);
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!(Category::parse("popular"), Some(Category::Popular));
        assert_eq!(Category::parse("top-rated"), Some(Category::TopRated));
        assert_eq!(Category::parse("on-the-air"), Some(Category::OnTheAir));
        assert_eq!(Category::parse("best-of"), None);
    }

    #[test]
    fn test_operation_paths() {
        assert_eq!(MetadataOp::MovieDetails.path(Some("603")), "/movie/603");
        assert_eq!(MetadataOp::SearchMulti.path(None), "/search/multi");
        assert_eq!(MetadataOp::Trending.path(None), "/trending/all/week");
    }
}
