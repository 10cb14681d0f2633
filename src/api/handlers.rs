//! API Handlers
//!
//! HTTP request handlers for the demo server endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::Html,
    Json,
};
use tracing::debug;

use crate::api::page::{demo_page, PAGE_KEY};
use crate::cache::CacheStore;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{HealthResponse, InvalidateResponse, PageQuery, StatsResponse};
use crate::render::{CachingMode, RenderContext};

/// Application state shared across all handlers.
///
/// The store synchronizes internally, so handlers share it through a plain `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Shared render cache
    pub cache: Arc<CacheStore>,
    /// Caching mode handed to every root render
    pub default_caching: CachingMode,
}

impl AppState {
    /// Creates a new AppState around an existing store.
    pub fn new(cache: Arc<CacheStore>, default_caching: CachingMode) -> Self {
        Self {
            cache,
            default_caching,
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Self {
        let cache = CacheStore::new(config.cache.clone());
        Self::new(Arc::new(cache), config.default_caching)
    }
}

/// Handler for GET /page
///
/// Renders the demo page through the range cache. Store calls wait on a
/// blocking lock, so the render runs on the blocking pool.
pub async fn page_handler(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>> {
    if let Some(error_msg) = query.validate() {
        return Err(CacheError::InvalidArgument(error_msg));
    }

    let page = demo_page(query.display_name());
    let body = tokio::task::spawn_blocking(move || {
        let ctx = RenderContext::new(&state.cache, state.default_caching);
        ctx.render_root(&page, PAGE_KEY)
    })
    .await
    .map_err(|err| CacheError::Internal(format!("page render failed: {}", err)))?;
    debug!(bytes = body.len(), "Rendered demo page");

    Ok(Html(body))
}

/// Handler for GET /stats
///
/// Returns current cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<StatsResponse>> {
    let stats = state.cache.stats()?;
    Ok(Json(StatsResponse::new(stats)))
}

/// Handler for DELETE /cache
///
/// Drops every cached entry.
pub async fn clear_handler(State(state): State<AppState>) -> Result<Json<InvalidateResponse>> {
    state.cache.clear()?;
    Ok(Json(InvalidateResponse::cleared()))
}

/// Handler for DELETE /cache/*key
///
/// Drops one cached entry, e.g. `page/0-1`.
pub async fn remove_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<InvalidateResponse>> {
    let key = key.trim_start_matches('/');
    if key.is_empty() {
        return Err(CacheError::InvalidArgument(
            "cache key cannot be empty".to_string(),
        ));
    }
    let removed = state.cache.remove(key)?;
    Ok(Json(InvalidateResponse::key(key, removed)))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
