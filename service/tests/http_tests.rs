//! HTTP integration tests using TestAppBuilder.
//!
//! These tests verify the HTTP layer around the record routes: health check,
//! CORS and the `OpenAPI`/Swagger endpoints.

mod common;

use axum::{
    body::Body,
    http::{
        header::{ACCESS_CONTROL_ALLOW_ORIGIN, ORIGIN},
        Method, Request, StatusCode,
    },
};
use common::app_builder::TestAppBuilder;
use common::get_json;
use tower::ServiceExt;

// =============================================================================
// Health Check Tests
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_returns_ok() {
    let app = TestAppBuilder::minimal().build();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_is_not_a_collection() {
    let (status, _) = get_json(TestAppBuilder::with_fixtures().build(), "/health").await;
    assert_eq!(status, StatusCode::OK);
}

// =============================================================================
// CORS Tests
// =============================================================================

async fn preflight(origins: &[&str], origin: &str) -> Option<String> {
    let app = TestAppBuilder::minimal().with_cors(origins).build();

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/health")
                .header(ORIGIN, origin)
                .header("Access-Control-Request-Method", "GET")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    response
        .headers()
        .get(ACCESS_CONTROL_ALLOW_ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

#[tokio::test]
async fn test_cors_allows_configured_origin() {
    let allowed = preflight(&["http://localhost:3000"], "http://localhost:3000").await;
    assert_eq!(allowed.as_deref(), Some("http://localhost:3000"));
}

#[tokio::test]
async fn test_cors_blocks_other_origins() {
    let allowed = preflight(&["http://localhost:3000"], "https://evil.example").await;
    assert_eq!(allowed, None);

    let allowed = preflight(&[], "http://localhost:3000").await;
    assert_eq!(allowed, None);
}

#[tokio::test]
async fn test_cors_wildcard_allows_any_origin() {
    let allowed = preflight(&["*"], "https://anywhere.example").await;
    assert_eq!(allowed.as_deref(), Some("*"));
}

// =============================================================================
// OpenAPI Tests
// =============================================================================

#[tokio::test]
async fn test_openapi_document_is_served() {
    let (status, body) = get_json(TestAppBuilder::with_fixtures().build(), "/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["info"]["title"], "Open Civic Data API");
    assert!(body["paths"]["/{collection}/"].is_object());
    assert!(body["components"]["schemas"]["ErrorResponse"].is_object());
}

#[tokio::test]
async fn test_swagger_ui_when_enabled() {
    let app = TestAppBuilder::with_fixtures().with_swagger().build();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/swagger-ui/")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
}
