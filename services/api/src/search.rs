//! Aggregated search across the metadata provider and the radio directory
//!
//! One free-text query fans out to both providers concurrently, merges the
//! heterogeneous result lists under a unified comparator, and paginates the
//! merged sequence. A failing branch contributes an empty list; only when
//! every requested branch fails does the request itself fail, so callers can
//! always tell "no matches" from "upstream unavailable".

use crate::error::{ApiError, ApiResult};
use crate::models::{KindBreakdown, SearchHit, SearchParams, SearchResponse};
use providers::{MediaKind, MetadataClient, ProviderError, RadioDirectoryClient};
use serde::Deserialize;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::warn;

/// Stations requested from the directory per search
const RADIO_SEARCH_LIMIT: u32 = 50;

const DEFAULT_LIMIT: u32 = 20;
const MAX_LIMIT: u32 = 100;

/// Comparator selected by the `sort_by` query parameter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Popularity,
    Rating,
    Year,
    Title,
}

/// Order two merged hits under one comparator
///
/// Numeric sorts are descending with missing values treated as zero; the
/// title sort is case-insensitive ascending. Radio stations sort by their
/// listener-count popularity proxy.
pub fn compare_hits(a: &SearchHit, b: &SearchHit, sort_by: SortBy) -> Ordering {
    match sort_by {
        SortBy::Rating => b.rating.total_cmp(&a.rating),
        SortBy::Year => b.year.unwrap_or(0).cmp(&a.year.unwrap_or(0)),
        SortBy::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        SortBy::Popularity => b.popularity.total_cmp(&a.popularity),
    }
}

/// Window the merged, sorted sequence
///
/// Pagination happens after the merge, never before. `has_more` reports
/// whether more results likely exist: the returned page came back full.
pub fn paginate(hits: Vec<SearchHit>, page: u32, limit: u32) -> (Vec<SearchHit>, bool) {
    let offset = (page.saturating_sub(1) as usize).saturating_mul(limit as usize);
    let window: Vec<SearchHit> = hits.into_iter().skip(offset).take(limit as usize).collect();
    let has_more = window.len() == limit as usize;
    (window, has_more)
}

/// Aggregated search service
#[derive(Clone)]
pub struct SearchService {
    metadata: Arc<MetadataClient>,
    radio: Arc<RadioDirectoryClient>,
}

impl SearchService {
    pub fn new(metadata: Arc<MetadataClient>, radio: Arc<RadioDirectoryClient>) -> Self {
        Self { metadata, radio }
    }

    /// Fan out, merge, sort, and paginate one search request
    pub async fn search(&self, params: &SearchParams) -> ApiResult<SearchResponse> {
        let query = params.q.as_deref().map(str::trim).unwrap_or_default();
        if query.is_empty() {
            return Err(ApiError::Validation(
                "query parameter 'q' is required".to_string(),
            ));
        }

        let page = params.page.unwrap_or(1).max(1);
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let sort_by = params.sort_by.unwrap_or_default();

        let want_metadata = !matches!(params.kind, Some(MediaKind::Radio));
        let want_radio = matches!(params.kind, None | Some(MediaKind::Radio));

        // Independent fan-out: branch failures do not cancel each other
        let (metadata_outcome, radio_outcome) = tokio::join!(
            self.metadata_branch(query, want_metadata),
            self.radio_branch(query, want_radio),
        );

        let mut hits: Vec<SearchHit> = Vec::new();
        let mut degraded: Vec<String> = Vec::new();
        let mut branch_errors: Vec<ProviderError> = Vec::new();
        let mut requested_branches = 0usize;

        for (name, outcome) in [("metadata", metadata_outcome), ("radio", radio_outcome)] {
            match outcome {
                None => {}
                Some(Ok(list)) => {
                    requested_branches += 1;
                    hits.extend(list);
                }
                Some(Err(err)) => {
                    requested_branches += 1;
                    warn!(branch = name, error = %err, "search branch failed; contributing empty results");
                    degraded.push(name.to_string());
                    branch_errors.push(err);
                }
            }
        }

        // Every requested branch failing is an upstream failure, not an
        // empty result
        if !branch_errors.is_empty() && branch_errors.len() == requested_branches {
            return Err(ApiError::from(branch_errors.remove(0)));
        }

        if let Some(kind) = params.kind {
            hits.retain(|hit| hit.kind == kind);
        }
        // Stations have no release year and are unaffected by the filter
        if let Some(year) = params.year {
            hits.retain(|hit| hit.kind == MediaKind::Radio || hit.year == Some(year));
        }

        hits.sort_by(|a, b| compare_hits(a, b, sort_by));

        let breakdown = KindBreakdown::count(&hits);
        let total = breakdown.total();
        let (results, has_more) = paginate(hits, page, limit);

        Ok(SearchResponse {
            query: query.to_string(),
            page,
            limit,
            total,
            has_more,
            breakdown,
            degraded,
            results,
        })
    }

    async fn metadata_branch(
        &self,
        query: &str,
        requested: bool,
    ) -> Option<Result<Vec<SearchHit>, ProviderError>> {
        if !requested {
            return None;
        }
        Some(
            self.metadata
                .search(query, 1)
                .await
                .map(|items| items.iter().map(SearchHit::from).collect()),
        )
    }

    async fn radio_branch(
        &self,
        query: &str,
        requested: bool,
    ) -> Option<Result<Vec<SearchHit>, ProviderError>> {
        if !requested {
            return None;
        }
        Some(
            self.radio
                .search_stations(query, RADIO_SEARCH_LIMIT)
                .await
                .map(|stations| stations.iter().map(SearchHit::from).collect()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(kind: MediaKind, title: &str, rating: f64, year: Option<i32>, popularity: f64) -> SearchHit {
        SearchHit {
            kind,
            id: title.to_lowercase().replace(' ', "-"),
            title: title.to_string(),
            poster: None,
            rating,
            year,
            popularity,
            stream_url: None,
        }
    }

    #[test]
    fn test_rating_sort_merges_descending_across_kinds() {
        let mut hits = vec![
            hit(MediaKind::Movie, "Low", 3.0, Some(2001), 1.0),
            hit(MediaKind::Movie, "High", 9.0, Some(2002), 1.0),
            hit(MediaKind::Tv, "Mid", 5.0, Some(2003), 1.0),
        ];
        hits.sort_by(|a, b| compare_hits(a, b, SortBy::Rating));

        let ratings: Vec<f64> = hits.iter().map(|h| h.rating).collect();
        assert_eq!(ratings, vec![9.0, 5.0, 3.0]);
    }

    #[test]
    fn test_year_sort_ranks_missing_years_last() {
        let mut hits = vec![
            hit(MediaKind::Radio, "Station", 0.0, None, 100.0),
            hit(MediaKind::Movie, "Newer", 7.0, Some(2020), 1.0),
            hit(MediaKind::Movie, "Older", 7.0, Some(1980), 1.0),
        ];
        hits.sort_by(|a, b| compare_hits(a, b, SortBy::Year));

        assert_eq!(hits[0].title, "Newer");
        assert_eq!(hits[1].title, "Older");
        assert_eq!(hits[2].title, "Station");
    }

    #[test]
    fn test_title_sort_is_case_insensitive() {
        let mut hits = vec![
            hit(MediaKind::Movie, "zulu", 0.0, None, 0.0),
            hit(MediaKind::Movie, "Alpha", 0.0, None, 0.0),
            hit(MediaKind::Tv, "echo", 0.0, None, 0.0),
        ];
        hits.sort_by(|a, b| compare_hits(a, b, SortBy::Title));

        let titles: Vec<&str> = hits.iter().map(|h| h.title.as_str()).collect();
        assert_eq!(titles, vec!["Alpha", "echo", "zulu"]);
    }

    #[test]
    fn test_popularity_sort_uses_listener_proxy_for_radio() {
        let mut hits = vec![
            hit(MediaKind::Movie, "Film", 8.0, Some(2010), 42.0),
            hit(MediaKind::Radio, "Big Station", 0.0, None, 5000.0),
            hit(MediaKind::Radio, "Small Station", 0.0, None, 3.0),
        ];
        hits.sort_by(|a, b| compare_hits(a, b, SortBy::Popularity));

        assert_eq!(hits[0].title, "Big Station");
        assert_eq!(hits[1].title, "Film");
        assert_eq!(hits[2].title, "Small Station");
    }

    #[test]
    fn test_pagination_windows_after_merge() {
        let hits: Vec<SearchHit> = (1..=5)
            .map(|i| hit(MediaKind::Movie, &format!("Movie {i}"), 0.0, None, 0.0))
            .collect();

        let (page1, has_more) = paginate(hits.clone(), 1, 2);
        assert_eq!(page1.len(), 2);
        assert_eq!(page1[0].title, "Movie 1");
        assert_eq!(page1[1].title, "Movie 2");
        assert!(has_more);

        let (page3, has_more) = paginate(hits, 3, 2);
        assert_eq!(page3.len(), 1);
        assert_eq!(page3[0].title, "Movie 5");
        assert!(!has_more);
    }

    #[test]
    fn test_pagination_past_the_end_is_empty() {
        let hits = vec![hit(MediaKind::Movie, "Only", 0.0, None, 0.0)];
        let (window, has_more) = paginate(hits, 9, 10);
        assert!(window.is_empty());
        assert!(!has_more);
    }

    #[test]
    fn test_breakdown_total_matches_sum() {
        let hits = vec![
            hit(MediaKind::Movie, "A", 0.0, None, 0.0),
            hit(MediaKind::Movie, "B", 0.0, None, 0.0),
            hit(MediaKind::Tv, "C", 0.0, None, 0.0),
            hit(MediaKind::Radio, "D", 0.0, None, 0.0),
        ];

        let breakdown = KindBreakdown::count(&hits);
        assert_eq!(breakdown.movies, 2);
        assert_eq!(breakdown.tv, 1);
        assert_eq!(breakdown.radio, 1);
        assert_eq!(breakdown.total(), hits.len());
    }
}
