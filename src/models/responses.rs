//! Response DTOs for the demo server
//!
//! Defines the structure of outgoing JSON response bodies.

use serde::Serialize;

use crate::cache::CacheStats;

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Counters and sizes
    #[serde(flatten)]
    pub stats: CacheStats,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl StatsResponse {
    /// Creates a new StatsResponse from cache statistics
    pub fn new(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            stats,
        }
    }
}

/// Response body for cache invalidation (DELETE /cache, DELETE /cache/*key)
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    /// Outcome message
    pub message: String,
    /// Whether anything was removed
    pub removed: bool,
}

impl InvalidateResponse {
    /// Response for a full clear
    pub fn cleared() -> Self {
        Self {
            message: "Cache cleared".to_string(),
            removed: true,
        }
    }

    /// Response for a single-key removal
    pub fn key(key: &str, removed: bool) -> Self {
        let message = if removed {
            format!("Key '{}' removed", key)
        } else {
            format!("Key '{}' was not cached", key)
        };
        Self { message, removed }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
