//! Error types for the upstream provider clients
//!
//! Every upstream failure is classified into one of these variants so that
//! callers can apply a uniform propagation policy regardless of which
//! provider produced the failure.

use thiserror::Error;

/// Result type alias for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors raised by the upstream provider clients
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No credential is configured for a provider that requires one
    #[error("provider credentials are not configured: {0}")]
    Configuration(String),

    /// The outbound call exceeded its fixed timeout
    #[error("upstream request timed out")]
    Timeout,

    /// The provider answered HTTP 429
    #[error("upstream rate limit exceeded")]
    RateLimited,

    /// The provider answered with a non-2xx status other than 429
    #[error("upstream returned HTTP {status}")]
    Upstream { status: u16 },

    /// The response body did not match the expected shape
    #[error("unexpected upstream response: {0}")]
    InvalidResponse(String),

    /// Connection-level failure before any status was received
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),
}

impl ProviderError {
    /// Classify a non-success HTTP status
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            Self::RateLimited
        } else {
            Self::Upstream {
                status: status.as_u16(),
            }
        }
    }

    /// True when the upstream positively confirmed the resource is absent
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Upstream { status: 404 })
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else if let Some(status) = err.status() {
            Self::from_status(status)
        } else {
            Self::Transport(err)
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        let err = ProviderError::from_status(reqwest::StatusCode::TOO_MANY_REQUESTS);
        assert!(matches!(err, ProviderError::RateLimited));

        let err = ProviderError::from_status(reqwest::StatusCode::BAD_GATEWAY);
        assert!(matches!(err, ProviderError::Upstream { status: 502 }));
    }

    #[test]
    fn test_not_found_detection() {
        assert!(ProviderError::from_status(reqwest::StatusCode::NOT_FOUND).is_not_found());
        assert!(!ProviderError::RateLimited.is_not_found());
        assert!(!ProviderError::Upstream { status: 500 }.is_not_found());
    }
}
