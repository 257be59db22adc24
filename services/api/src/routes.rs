//! API service routes

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use std::str::FromStr;
use uuid::Uuid;

use providers::{MediaKind, metadata::Category};

use crate::{
    error::ApiError,
    models::{
        CategoryQuery, CategoryResponse, CollectionEntryRequest, ContentQuery, RatingRequest,
        SearchParams,
    },
    state::AppState,
};

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/content/:kind/:id", get(resolve_content))
        .route("/search", get(search))
        .route("/categories/:name", get(list_category))
        .route("/genres", get(list_genres))
        .route("/radio/tags", get(radio_tags))
        .route("/radio/countries", get(radio_countries))
        .route("/radio/cache/flush", post(flush_radio_cache))
        .route("/users/:id/favorites", post(add_favorite))
        .route("/users/:id/watchlist", post(add_watchlist))
        .route("/users/:id/ratings", post(add_rating))
        .with_state(state)
}

/// Health check endpoint with store and cache introspection
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = common::database::health_check(&state.db_pool)
        .await
        .unwrap_or(false);

    let movies = state
        .content_repository
        .count_by_kind(MediaKind::Movie)
        .await
        .unwrap_or(0);
    let tv = state
        .content_repository
        .count_by_kind(MediaKind::Tv)
        .await
        .unwrap_or(0);

    Json(json!({
        "status": "ok",
        "service": "api-service",
        "database": database,
        "documents": {
            "movies": movies,
            "tv": tv,
        },
        "cache_entries": {
            "metadata": state.metadata.cache_entries().await,
            "video": state.video.cache_entries().await,
            "radio": state.radio.cache_entries().await,
        }
    }))
}

/// Resolve one content item by kind and upstream id
pub async fn resolve_content(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    Query(query): Query<ContentQuery>,
) -> Result<impl IntoResponse, ApiError> {
    // the kind is validated before any network or store access
    let kind = MediaKind::from_str(&kind).map_err(|e| ApiError::Validation(e.to_string()))?;

    let response = state.resolver.resolve(kind, &id, query.viewer_id).await?;
    Ok(Json(response))
}

/// Aggregated search across all content kinds
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.search.search(&params).await?;
    Ok(Json(response))
}

/// One page of a metadata discovery list
pub async fn list_category(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<CategoryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let category = Category::parse(&name)
        .ok_or_else(|| ApiError::Validation(format!("unknown category: {name}")))?;
    let page = query.page.unwrap_or(1).max(1);

    let results = state
        .metadata
        .list_category(category, page)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(CategoryResponse {
        category: category.as_str().to_string(),
        page,
        results,
    }))
}

/// Genre reference list
pub async fn list_genres(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let genres = state.metadata.genres().await.map_err(ApiError::from)?;
    Ok(Json(json!({ "genres": genres })))
}

/// Radio tag reference list
pub async fn radio_tags(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let tags = state.radio.tags(100).await.map_err(ApiError::from)?;
    Ok(Json(json!({ "tags": tags })))
}

/// Radio country reference list
pub async fn radio_countries(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let countries = state.radio.countries().await.map_err(ApiError::from)?;
    Ok(Json(json!({ "countries": countries })))
}

/// Drop every cached radio directory response
pub async fn flush_radio_cache(State(state): State<AppState>) -> impl IntoResponse {
    state.radio.flush_cache().await;
    Json(json!({ "status": "flushed" }))
}

/// Add a favorites entry for a user
pub async fn add_favorite(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<CollectionEntryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let added = state
        .profile_repository
        .add_favorite(user_id, payload.kind, &payload.external_id, &payload.title)
        .await
        .map_err(|e| {
            tracing::error!("Failed to add favorite: {}", e);
            ApiError::Database(e)
        })?;

    Ok((StatusCode::CREATED, Json(json!({ "added": added }))))
}

/// Add a watchlist entry for a user
pub async fn add_watchlist(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<CollectionEntryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let added = state
        .profile_repository
        .add_watchlist(user_id, payload.kind, &payload.external_id, &payload.title)
        .await
        .map_err(|e| {
            tracing::error!("Failed to add watchlist entry: {}", e);
            ApiError::Database(e)
        })?;

    Ok((StatusCode::CREATED, Json(json!({ "added": added }))))
}

/// Record a rating for a user
pub async fn add_rating(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<RatingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !(0.0..=10.0).contains(&payload.rating) {
        return Err(ApiError::Validation(
            "rating must be between 0 and 10".to_string(),
        ));
    }

    state
        .profile_repository
        .add_rating(user_id, payload.kind, &payload.external_id, payload.rating)
        .await
        .map_err(|e| {
            tracing::error!("Failed to record rating: {}", e);
            ApiError::Database(e)
        })?;

    Ok((StatusCode::CREATED, Json(json!({ "status": "recorded" }))))
}
