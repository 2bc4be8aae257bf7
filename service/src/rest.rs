//! REST handlers and `OpenAPI` documentation.
//!
//! Every entity type shares one list handler and one detail handler; the
//! collection segment of the path selects the [`EntityType`].

// The OpenApi derive macro generates code that triggers this lint
#![allow(clippy::needless_for_each)]

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, RawQuery},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use ocd_query::{
    executor, projector::Meta, CivicStore, Endpoint, EntityType, ErrorResponse, ListEnvelope,
    QueryError, QueryParams, QuerySettings, RequestContext,
};
use serde_json::Value;
use utoipa::OpenApi;

/// Errors a REST handler can return.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("unknown collection '{0}'")]
    UnknownCollection(String),

    #[error(transparent)]
    Query(#[from] QueryError),
}

impl ApiError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::UnknownCollection(_) | Self::Query(QueryError::NotFound { .. }) => {
                StatusCode::NOT_FOUND
            }
            Self::Query(QueryError::InvalidParameter { .. }) => StatusCode::BAD_REQUEST,
            Self::Query(QueryError::DataUnavailable(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let body = match &self {
            Self::UnknownCollection(_) => ErrorResponse {
                error: self.to_string(),
                parameter: None,
            },
            Self::Query(err @ QueryError::InvalidParameter { key, .. }) => {
                tracing::debug!(parameter = %key, "rejected request: {err}");
                ErrorResponse::from(err)
            }
            Self::Query(err @ QueryError::DataUnavailable(cause)) => {
                tracing::error!("query failed: {cause}");
                ErrorResponse::from(err)
            }
            Self::Query(err) => ErrorResponse::from(err),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// `OpenAPI` documentation for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Open Civic Data API",
        version = "1.0.0",
        description = "Read-only access to bills, people, organizations, events, votes, jurisdictions and divisions",
        license(name = "MIT")
    ),
    paths(list_entities, get_entity, health_check),
    components(schemas(ListEnvelope, Meta, ErrorResponse))
)]
pub struct ApiDoc;

/// Routes for every entity collection plus the `OpenAPI` document.
///
/// Handlers expect `Extension<Arc<dyn CivicStore>>` and
/// `Extension<Arc<QuerySettings>>` layers.
pub fn router() -> Router {
    Router::new()
        .route("/openapi.json", get(openapi_json))
        .route("/{collection}", get(list_entities))
        .route("/{collection}/", get(list_entities))
        .route("/{collection}/{*ocd_id}", get(get_entity))
}

fn collection_entity(collection: &str) -> Result<EntityType, ApiError> {
    EntityType::from_plural(collection)
        .ok_or_else(|| ApiError::UnknownCollection(collection.to_string()))
}

/// List records of one entity type
///
/// Every query parameter other than `fields`, `q`, `page`, `per_page` and
/// `sort` must be a filter registered for the collection.
///
/// # Errors
///
/// Returns 400 for unrecognized or malformed parameters, 404 for an unknown
/// collection and 500 when the data store fails.
#[utoipa::path(
    get,
    path = "/{collection}/",
    tag = "Records",
    params(
        ("collection" = String, Path, description = "bills, people, organizations, events, votes, jurisdictions or divisions"),
        ("fields" = Option<String>, Query, description = "Comma-separated output fields"),
        ("q" = Option<String>, Query, description = "Full-text search terms"),
        ("page" = Option<u32>, Query, description = "1-based page number"),
        ("per_page" = Option<u32>, Query, description = "Results per page"),
        ("sort" = Option<String>, Query, description = "Sort field, '-' prefix for descending"),
    ),
    responses(
        (status = 200, description = "One page of results", body = ListEnvelope),
        (status = 400, description = "Invalid query parameter", body = ErrorResponse),
        (status = 404, description = "Unknown collection", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn list_entities(
    Path(collection): Path<String>,
    RawQuery(query): RawQuery,
    Extension(store): Extension<Arc<dyn CivicStore>>,
    Extension(settings): Extension<Arc<QuerySettings>>,
) -> Result<Json<ListEnvelope>, ApiError> {
    let entity = collection_entity(&collection)?;
    let params = QueryParams::parse(query.as_deref())?;
    let ctx = RequestContext::build(entity, Endpoint::List, &params, &settings)?;
    Ok(Json(executor::list(store.as_ref(), &ctx).await?))
}

/// Fetch one record by OCD identifier
///
/// Only the `fields` parameter is accepted.
///
/// # Errors
///
/// Returns 400 for parameters other than `fields`, 404 for an unknown
/// collection or identifier and 500 when the data store fails.
#[utoipa::path(
    get,
    path = "/{collection}/{ocd_id}/",
    tag = "Records",
    params(
        ("collection" = String, Path, description = "Entity collection"),
        ("ocd_id" = String, Path, description = "OCD identifier, e.g. ocd-division/country:us/state:nc"),
        ("fields" = Option<String>, Query, description = "Comma-separated output fields"),
    ),
    responses(
        (status = 200, description = "The projected record", content_type = "application/json"),
        (status = 400, description = "Invalid query parameter", body = ErrorResponse),
        (status = 404, description = "No such record", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn get_entity(
    Path((collection, ocd_id)): Path<(String, String)>,
    RawQuery(query): RawQuery,
    Extension(store): Extension<Arc<dyn CivicStore>>,
    Extension(settings): Extension<Arc<QuerySettings>>,
) -> Result<Json<Value>, ApiError> {
    let entity = collection_entity(&collection)?;
    let params = QueryParams::parse(query.as_deref())?;
    let ctx = RequestContext::build(entity, Endpoint::Detail, &params, &settings)?;
    let id = ocd_id.trim_end_matches('/');
    Ok(Json(executor::detail(store.as_ref(), &ctx, id).await?))
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    responses((status = 200, description = "Service is up"))
)]
#[allow(clippy::unused_async)] // Required for Axum handler signature
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

#[allow(clippy::unused_async)] // Required for Axum handler signature
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
