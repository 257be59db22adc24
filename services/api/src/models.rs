//! API models for request and response payloads

use providers::{MediaKind, NormalizedItem, RadioStationRecord};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::search::SortBy;

/// Query parameters for content resolution
#[derive(Debug, Clone, Deserialize)]
pub struct ContentQuery {
    /// Identified user whose watch history receives an entry
    pub viewer_id: Option<Uuid>,
}

/// Response for a resolved content item
#[derive(Debug, Clone, Serialize)]
pub struct ContentResponse {
    pub item: NormalizedItem,
    pub views: i64,
    /// True when a stale fallback was served after an upstream failure
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded_reason: Option<String>,
}

/// Query parameters for aggregated search
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    /// Free-text query
    pub q: Option<String>,
    /// Restrict results to one kind
    pub kind: Option<MediaKind>,
    /// Page number (1-based), applied to the merged sequence
    pub page: Option<u32>,
    /// Number of items per page
    pub limit: Option<u32>,
    /// Comparator for the merged sequence
    pub sort_by: Option<SortBy>,
    /// Keep only movie/TV items from this release year
    pub year: Option<i32>,
}

/// One row of a merged search result, unified across kinds
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub kind: MediaKind,
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    pub rating: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    pub popularity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_url: Option<String>,
}

impl From<&NormalizedItem> for SearchHit {
    fn from(item: &NormalizedItem) -> Self {
        Self {
            kind: item.kind,
            id: item.external_id.clone(),
            title: item.title.clone(),
            poster: item.poster.clone(),
            rating: item.rating,
            year: item.year,
            popularity: item.popularity,
            stream_url: None,
        }
    }
}

impl From<&RadioStationRecord> for SearchHit {
    fn from(station: &RadioStationRecord) -> Self {
        Self {
            kind: MediaKind::Radio,
            id: station.station_id.clone(),
            title: station.name.clone(),
            poster: None,
            rating: 0.0,
            year: None,
            // stations have no popularity score; listener count stands in
            popularity: station.popularity(),
            stream_url: Some(station.stream_url.clone()),
        }
    }
}

/// Per-kind result counts; the response total always equals their sum
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KindBreakdown {
    pub movies: usize,
    pub tv: usize,
    pub radio: usize,
}

impl KindBreakdown {
    pub fn count(hits: &[SearchHit]) -> Self {
        let mut breakdown = Self::default();
        for hit in hits {
            match hit.kind {
                MediaKind::Movie => breakdown.movies += 1,
                MediaKind::Tv => breakdown.tv += 1,
                MediaKind::Radio => breakdown.radio += 1,
            }
        }
        breakdown
    }

    pub fn total(&self) -> usize {
        self.movies + self.tv + self.radio
    }
}

/// Response for aggregated search
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub page: u32,
    pub limit: u32,
    pub total: usize,
    pub has_more: bool,
    pub breakdown: KindBreakdown,
    /// Branches that failed upstream and contributed empty results
    pub degraded: Vec<String>,
    pub results: Vec<SearchHit>,
}

/// Query parameters for category listing
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryQuery {
    pub page: Option<u32>,
}

/// Response for a category listing
#[derive(Debug, Clone, Serialize)]
pub struct CategoryResponse {
    pub category: String,
    pub page: u32,
    pub results: Vec<NormalizedItem>,
}

/// Request to add a favorites or watchlist entry
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionEntryRequest {
    pub kind: MediaKind,
    pub external_id: String,
    pub title: String,
}

/// Request to record a rating
#[derive(Debug, Clone, Deserialize)]
pub struct RatingRequest {
    pub kind: MediaKind,
    pub external_id: String,
    /// 0.0 to 10.0 inclusive
    pub rating: f32,
}
