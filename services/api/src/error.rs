//! Custom error types for the API service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use providers::ProviderError;
use serde_json::json;
use thiserror::Error;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Invalid request input, rejected before any network or store access
    #[error("Validation error: {0}")]
    Validation(String),

    /// The content exists neither in the store nor upstream
    #[error("Not found: {0}")]
    NotFound(String),

    /// Classified upstream failure with no usable fallback
    #[error("Upstream failure: {0}")]
    Upstream(ProviderError),

    /// Database error
    #[error("Database error: {0}")]
    Database(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Database(err)
    }
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        if err.is_not_found() {
            ApiError::NotFound("upstream reports no such content".to_string())
        } else {
            ApiError::Upstream(err)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Upstream(err) => (upstream_status(err), err.to_string()),
            ApiError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// A failed request is distinguishable from an empty-but-successful one by
/// its status code; upstream failure classes each map to their own status.
fn upstream_status(err: &ProviderError) -> StatusCode {
    match err {
        ProviderError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ProviderError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        ProviderError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_GATEWAY,
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
