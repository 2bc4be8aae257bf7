//! Query execution against a [`CivicStore`].

use std::time::Instant;

use serde_json::Value;

use crate::compiler;
use crate::context::RequestContext;
use crate::error::QueryError;
use crate::projector::{self, ListEnvelope};
use crate::store::{CivicStore, Record, StoreQuery};

/// One page of matching records.
#[derive(Debug, Clone)]
pub struct Page {
    pub records: Vec<Record>,
    pub has_next: bool,
}

/// Compile the context's bindings and fetch one page.
///
/// One row past the page is requested to learn whether a next page exists;
/// it is dropped before returning.
///
/// # Errors
///
/// Returns `QueryError::DataUnavailable` if the store fails.
pub async fn fetch_page(store: &dyn CivicStore, ctx: &RequestContext) -> Result<Page, QueryError> {
    let per_page = ctx.pagination.per_page;
    let query = StoreQuery {
        entity: ctx.entity,
        predicate: compiler::compile(ctx.entity, &ctx.bindings, &ctx.options),
        columns: ctx.field_names(),
        order: ctx.order,
        limit: per_page.saturating_add(1),
        offset: ctx.pagination.offset(),
    };

    tracing::debug!(
        entity = %ctx.entity,
        filters = ?ctx.filter_keys(),
        page = ctx.pagination.page,
        per_page,
        "fetching page"
    );

    let mut records = store.find(&query).await?;
    let keep = usize::try_from(per_page).unwrap_or(usize::MAX);
    let has_next = records.len() > keep;
    records.truncate(keep);

    Ok(Page { records, has_next })
}

/// Fetch a record by identifier.
///
/// Identifiers that are malformed for the entity type are reported as not
/// found without consulting the store.
///
/// # Errors
///
/// Returns `QueryError::NotFound` or `QueryError::DataUnavailable`.
pub async fn fetch_one(
    store: &dyn CivicStore,
    ctx: &RequestContext,
    id: &str,
) -> Result<Record, QueryError> {
    let not_found = || QueryError::NotFound {
        entity: ctx.entity.plural(),
        id: id.to_string(),
    };

    if !ctx.entity.accepts_id(id) {
        tracing::debug!(entity = %ctx.entity, id, "malformed identifier");
        return Err(not_found());
    }

    store
        .find_by_id(ctx.entity, id, &ctx.field_names())
        .await?
        .ok_or_else(not_found)
}

/// Run a list request end to end and shape the envelope.
///
/// # Errors
///
/// Returns `QueryError::DataUnavailable` if the store fails.
pub async fn list(store: &dyn CivicStore, ctx: &RequestContext) -> Result<ListEnvelope, QueryError> {
    let started = Instant::now();
    let page = fetch_page(store, ctx).await?;
    Ok(projector::list_envelope(
        ctx,
        &page.records,
        page.has_next,
        started.elapsed(),
    ))
}

/// Run a detail request end to end and shape the object.
///
/// # Errors
///
/// Returns `QueryError::NotFound` or `QueryError::DataUnavailable`.
pub async fn detail(
    store: &dyn CivicStore,
    ctx: &RequestContext,
    id: &str,
) -> Result<Value, QueryError> {
    let started = Instant::now();
    let record = fetch_one(store, ctx, id).await?;
    Ok(projector::detail_object(ctx, &record, started.elapsed()))
}
