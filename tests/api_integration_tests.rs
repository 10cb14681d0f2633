//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use render_cache::{api::create_router, AppState, CacheStore, CachingMode};
use serde_json::Value;
use tower::ServiceExt;

// == Helper Functions ==

fn create_test_app(mode: CachingMode) -> (Router, Arc<CacheStore>) {
    let cache = Arc::new(CacheStore::with_max_size(Some(100_000)));
    let state = AppState::new(cache.clone(), mode);
    (create_router(state), cache)
}

async fn send(app: &Router, method: &str, uri: &str) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn send_json(app: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let (status, body) = send(app, method, uri).await;
    (status, serde_json::from_str(&body).unwrap())
}

// == Page Endpoint Tests ==

#[tokio::test]
async fn test_page_renders_per_request_content() {
    let (app, _) = create_test_app(CachingMode::Cacheable);

    let (status, alice) = send(&app, "GET", "/page?user=alice").await;
    assert_eq!(status, StatusCode::OK);
    assert!(alice.contains("Hello, alice!"));

    // Static layout is cached, the greeting is not frozen
    let (_, bob) = send(&app, "GET", "/page?user=bob").await;
    assert!(bob.contains("Hello, bob!"));
    assert!(!bob.contains("alice"));
}

#[tokio::test]
async fn test_page_escapes_user() {
    let (app, _) = create_test_app(CachingMode::Cacheable);

    let (status, body) = send(&app, "GET", "/page?user=%3Cscript%3E").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Hello, &lt;script&gt;!"));
    assert!(!body.contains("<script>"));
}

#[tokio::test]
async fn test_page_repeat_requests_hit_cache() {
    let (app, cache) = create_test_app(CachingMode::Cacheable);

    send(&app, "GET", "/page").await;
    let before = cache.stats().unwrap();
    send(&app, "GET", "/page").await;
    let after = cache.stats().unwrap();

    assert_eq!(after.misses, before.misses);
    assert!(after.hits > before.hits);
}

#[tokio::test]
async fn test_page_uncached_default_still_renders() {
    let (app, cache) = create_test_app(CachingMode::NotCacheable);

    let (status, body) = send(&app, "GET", "/page?user=erin").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Render cache demo"));
    assert!(body.contains("Hello, erin!"));
    // Only the head markup and the explicitly cacheable clock run are stored
    assert!(!cache.contains_key("page/0-1").unwrap());
}

#[tokio::test]
async fn test_page_rejects_long_user() {
    let (app, _) = create_test_app(CachingMode::Cacheable);
    let uri = format!("/page?user={}", "x".repeat(100));

    let (status, json) = send_json(&app, "GET", &uri).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("maximum length"));
}

// == Stats Endpoint Tests ==

#[tokio::test]
async fn test_stats_endpoint_reports_sizes() {
    let (app, cache) = create_test_app(CachingMode::Cacheable);
    cache.set("k", "12345", None).unwrap();

    let (status, json) = send_json(&app, "GET", "/stats").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_entries"], 1);
    assert_eq!(json["current_size"], 5);
    assert_eq!(json["max_size"], 100_000);
    assert!(json.get("hit_rate").is_some());
}

// == Invalidation Endpoint Tests ==

#[tokio::test]
async fn test_clear_endpoint_empties_cache() {
    let (app, cache) = create_test_app(CachingMode::Cacheable);
    send(&app, "GET", "/page").await;
    assert!(!cache.is_empty().unwrap());

    let (status, json) = send_json(&app, "DELETE", "/cache").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["removed"], true);
    assert!(cache.is_empty().unwrap());
    assert_eq!(cache.current_size().unwrap(), 0);
}

#[tokio::test]
async fn test_remove_endpoint_accepts_nested_keys() {
    let (app, cache) = create_test_app(CachingMode::Cacheable);
    send(&app, "GET", "/page").await;
    assert!(cache.contains_key("page/0-1").unwrap());

    let (status, json) = send_json(&app, "DELETE", "/cache/page/0-1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["removed"], true);
    assert!(!cache.contains_key("page/0-1").unwrap());

    let (status, json) = send_json(&app, "DELETE", "/cache/page/0-1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["removed"], false);
}

// == Health Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _) = create_test_app(CachingMode::Cacheable);

    let (status, json) = send_json(&app, "GET", "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert!(json["timestamp"].is_string());
}
