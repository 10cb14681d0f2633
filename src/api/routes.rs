//! API Routes
//!
//! Configures the Axum router with all demo server endpoints.

use axum::{
    routing::{delete, get},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_handler, health_handler, page_handler, remove_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/page", get(page_handler))
        .route("/stats", get(stats_handler))
        .route("/cache", delete(clear_handler))
        .route("/cache/*key", delete(remove_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStore;
    use crate::render::CachingMode;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use tower::util::ServiceExt;

    fn create_test_app() -> Router {
        let cache = Arc::new(CacheStore::with_max_size(Some(100_000)));
        create_router(AppState::new(cache, CachingMode::Cacheable))
    }

    async fn status_of(app: Router, method: &str, uri: &str) -> StatusCode {
        app.oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
        .status()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        assert_eq!(
            status_of(create_test_app(), "GET", "/health").await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn test_page_endpoint() {
        assert_eq!(
            status_of(create_test_app(), "GET", "/page?user=dave").await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn test_clear_endpoint() {
        assert_eq!(
            status_of(create_test_app(), "DELETE", "/cache").await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn test_unknown_route() {
        assert_eq!(
            status_of(create_test_app(), "GET", "/get/anything").await,
            StatusCode::NOT_FOUND
        );
    }
}
