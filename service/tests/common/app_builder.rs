//! Test app builder that mirrors main.rs wiring with an injectable store.
//!
//! [`TestAppBuilder`] constructs an Axum router matching the production
//! configuration in `main.rs`, but backed by a `MemoryStore` fixture or a
//! `MockStore` instead of Postgres.
//!
//! # Preset Builders
//!
//! - [`TestAppBuilder::minimal()`] - Health check only
//! - [`TestAppBuilder::with_fixtures()`] - Full app over the shared fixture store
//! - [`TestAppBuilder::with_mock()`] - Full app over a `MockStore`

use std::sync::Arc;

use axum::{
    http::{HeaderValue, Method},
    routing::get,
    Extension, Router,
};
use ocd_api::rest::{self, ApiDoc};
use ocd_query::{store::mock::MockStore, CivicStore, QuerySettings};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::fixtures;

/// Builder for test applications that mirrors main.rs wiring.
pub struct TestAppBuilder {
    /// Store behind the record routes (None means no record routes)
    store: Option<Arc<dyn CivicStore>>,
    /// Query settings handed to the handlers
    settings: QuerySettings,
    /// Whether to include health check route
    include_health: bool,
    /// Whether to include Swagger UI
    include_swagger: bool,
    /// CORS allowed origins (None means no CORS layer)
    cors_origins: Option<Vec<String>>,
}

impl Default for TestAppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestAppBuilder {
    /// Create a new empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: None,
            settings: QuerySettings::default(),
            include_health: false,
            include_swagger: false,
            cors_origins: None,
        }
    }

    // =========================================================================
    // Preset Builders
    // =========================================================================

    /// Create a minimal app with only the health check endpoint.
    #[must_use]
    pub fn minimal() -> Self {
        Self::new().with_health()
    }

    /// Full app over the shared fixture store.
    #[must_use]
    pub fn with_fixtures() -> Self {
        Self::new()
            .with_store(Arc::new(fixtures::store()))
            .with_health()
            .with_cors(&["http://localhost:3000"])
    }

    /// Full app over `mock`, so tests can inspect the queries it received.
    #[must_use]
    pub fn with_mock(mock: Arc<MockStore>) -> Self {
        Self::new().with_store(mock).with_health()
    }

    // =========================================================================
    // Component Configuration
    // =========================================================================

    /// Serve the record routes from `store`.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn CivicStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Override the query settings.
    #[must_use]
    pub fn with_settings(mut self, settings: QuerySettings) -> Self {
        self.settings = settings;
        self
    }

    /// Include health check route (/health).
    #[must_use]
    pub fn with_health(mut self) -> Self {
        self.include_health = true;
        self
    }

    /// Include Swagger UI (/swagger-ui).
    #[must_use]
    pub fn with_swagger(mut self) -> Self {
        self.include_swagger = true;
        self
    }

    /// Configure CORS with specific allowed origins.
    ///
    /// Pass an empty slice to block all cross-origin requests.
    /// Pass `&["*"]` to allow any origin.
    #[must_use]
    pub fn with_cors(mut self, origins: &[&str]) -> Self {
        self.cors_origins = Some(origins.iter().map(|s| (*s).to_string()).collect());
        self
    }

    // =========================================================================
    // Build
    // =========================================================================

    /// Build the Axum router.
    ///
    /// The layer ordering matches main.rs:
    /// 1. Routes (records, health, Swagger)
    /// 2. Extensions (store, settings)
    /// 3. CORS layer
    /// 4. Trace layer (outermost)
    #[must_use]
    pub fn build(self) -> Router {
        let mut app = Router::new();

        if self.store.is_some() {
            app = app.merge(rest::router());
        }

        if self.include_health {
            app = app.route("/health", get(rest::health_check));
        }

        if self.include_swagger {
            app = app.merge(
                SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()),
            );
        }

        if let Some(store) = self.store {
            app = app.layer(Extension(store));
        }
        app = app.layer(Extension(Arc::new(self.settings)));

        if let Some(origins) = self.cors_origins {
            let allow_origin: AllowOrigin = if origins.iter().any(|o| o == "*") {
                AllowOrigin::any()
            } else if origins.is_empty() {
                AllowOrigin::list(Vec::<HeaderValue>::new())
            } else {
                let header_values: Vec<HeaderValue> = origins
                    .iter()
                    .filter_map(|origin| origin.parse().ok())
                    .collect();
                AllowOrigin::list(header_values)
            };

            app = app.layer(
                CorsLayer::new()
                    .allow_methods([Method::GET, Method::OPTIONS])
                    .allow_headers(Any)
                    .allow_origin(allow_origin),
            );
        }

        app.layer(TraceLayer::new_for_http())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_minimal_builder_creates_health_route() {
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
    async fn test_minimal_builder_has_no_record_routes() {
        let app = TestAppBuilder::minimal().build();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/bills/")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
