//! Error types for the render cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the render cache.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Missing or empty key passed to a store operation
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The store lock could not be acquired within the configured timeout
    #[error("Cache busy: {0}")]
    CacheBusy(String),

    /// A render task panicked or was cancelled
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// Returns true if the operation may succeed when retried.
    ///
    /// Callers that hit a busy cache are expected to render directly instead.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CacheError::CacheBusy(_))
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            CacheError::CacheBusy(_) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the render cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_is_retryable() {
        assert!(CacheError::CacheBusy("write lock".to_string()).is_retryable());
        assert!(!CacheError::InvalidArgument("key".to_string()).is_retryable());
        assert!(!CacheError::Internal("join".to_string()).is_retryable());
    }

    #[test]
    fn test_status_codes() {
        let resp = CacheError::InvalidArgument("empty key".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = CacheError::CacheBusy("timeout".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

        let resp = CacheError::Internal("render task panicked".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
