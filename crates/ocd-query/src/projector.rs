//! Response shaping: field selection and the list envelope.
//!
//! Projection never fails. Unknown field names are dropped and registered
//! fields missing from a record come out as `null`.

use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::context::RequestContext;
use crate::entity::EntityType;
use crate::registry::{self, Endpoint, FieldDescriptor};
use crate::store::Record;

/// Resolve the fields to project from the raw `fields` parameter.
///
/// Blank or absent means the endpoint's default set. Otherwise names are
/// split on commas, trimmed, filtered to registered fields and
/// de-duplicated in request order.
#[must_use]
pub fn resolve_fields(
    entity: EntityType,
    endpoint: Endpoint,
    requested: Option<&str>,
) -> Vec<&'static FieldDescriptor> {
    let Some(requested) = requested.filter(|r| !r.trim().is_empty()) else {
        return registry::default_fields(entity, endpoint);
    };

    let mut fields: Vec<&'static FieldDescriptor> = Vec::new();
    for name in requested.split(',').map(str::trim) {
        match registry::find_field(entity, name) {
            Some(field) if !fields.iter().any(|f| f.name == field.name) => fields.push(field),
            Some(_) => {}
            None if name.is_empty() => {}
            None => tracing::trace!(entity = %entity, field = name, "dropping unknown field"),
        }
    }
    fields
}

/// Keep exactly `fields` from `record`, in order.
#[must_use]
pub fn project(record: &Record, fields: &[&'static FieldDescriptor]) -> Map<String, Value> {
    fields
        .iter()
        .map(|f| {
            (
                f.name.to_string(),
                record.get(f.name).cloned().unwrap_or(Value::Null),
            )
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Meta {
    /// Number of results on this page.
    pub count: usize,
    pub page: u32,
    pub per_page: u32,
    pub next_page: Option<u32>,
}

/// Diagnostics attached when debug output is enabled.
#[derive(Debug, Clone, Serialize)]
pub struct DebugInfo {
    pub entity: EntityType,
    pub endpoint: Endpoint,
    pub filters: Vec<&'static str>,
    pub fields: Vec<&'static str>,
    pub elapsed_ms: u128,
}

impl DebugInfo {
    fn from_context(ctx: &RequestContext, elapsed: Duration) -> Self {
        Self {
            entity: ctx.entity,
            endpoint: ctx.endpoint,
            filters: ctx.filter_keys(),
            fields: ctx.field_names(),
            elapsed_ms: elapsed.as_millis(),
        }
    }
}

/// Body of a list response.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ListEnvelope {
    pub meta: Meta,
    #[cfg_attr(feature = "openapi", schema(value_type = Vec<Object>))]
    pub results: Vec<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub debug: Option<DebugInfo>,
}

/// Wrap a page of records. `has_next` says whether a further page exists.
#[must_use]
pub fn list_envelope(
    ctx: &RequestContext,
    records: &[Record],
    has_next: bool,
    elapsed: Duration,
) -> ListEnvelope {
    let results: Vec<Map<String, Value>> =
        records.iter().map(|r| project(r, &ctx.fields)).collect();

    ListEnvelope {
        meta: Meta {
            count: results.len(),
            page: ctx.pagination.page,
            per_page: ctx.pagination.per_page,
            next_page: has_next.then(|| ctx.pagination.page.saturating_add(1)),
        },
        results,
        debug: ctx
            .debug
            .then(|| DebugInfo::from_context(ctx, elapsed)),
    }
}

/// Project a single record for a detail response.
#[must_use]
pub fn detail_object(ctx: &RequestContext, record: &Record, elapsed: Duration) -> Value {
    let mut object = project(record, &ctx.fields);
    if ctx.debug {
        if let Ok(debug) = serde_json::to_value(DebugInfo::from_context(ctx, elapsed)) {
            object.insert("debug".to_string(), debug);
        }
    }
    Value::Object(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::QuerySettings;
    use crate::params::QueryParams;
    use serde_json::json;

    fn names(fields: &[&FieldDescriptor]) -> Vec<&'static str> {
        fields.iter().map(|f| f.name).collect()
    }

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn blank_fields_means_defaults() {
        for raw in [None, Some(""), Some("  ")] {
            assert_eq!(
                names(&resolve_fields(EntityType::Bill, Endpoint::List, raw)),
                vec!["id", "identifier", "title", "classification", "subject"],
                "{raw:?}"
            );
        }
    }

    #[test]
    fn requested_fields_are_filtered_trimmed_and_deduplicated() {
        let fields = resolve_fields(
            EntityType::Bill,
            Endpoint::List,
            Some("title, legislative_session,bogus,,title,from_organization_id"),
        );
        assert_eq!(
            names(&fields),
            vec!["title", "legislative_session", "from_organization_id"]
        );
    }

    #[test]
    fn all_unknown_fields_project_nothing() {
        let fields = resolve_fields(EntityType::Vote, Endpoint::Detail, Some("foo,bar"));
        assert!(fields.is_empty());
        assert!(project(&record(json!({"id": "x"})), &fields).is_empty());
    }

    #[test]
    fn missing_fields_project_as_null() {
        let fields = resolve_fields(EntityType::Person, Endpoint::Detail, Some("id,image"));
        let projected = project(&record(json!({"id": "ocd-person/1", "secret": 1})), &fields);
        assert_eq!(Value::Object(projected), json!({"id": "ocd-person/1", "image": null}));
    }

    #[test]
    fn envelope_counts_the_page() {
        let params = QueryParams::default();
        let ctx = RequestContext::build(
            EntityType::Jurisdiction,
            Endpoint::List,
            &params,
            &QuerySettings::default(),
        )
        .expect("context");
        let records = vec![record(json!({"id": "a"})), record(json!({"id": "b"}))];

        let envelope = list_envelope(&ctx, &records, true, Duration::ZERO);
        let body = serde_json::to_value(&envelope).expect("serialize");
        assert_eq!(
            body["meta"],
            json!({"count": 2, "page": 1, "per_page": 10, "next_page": 2})
        );
        assert_eq!(body["results"][0]["url"], Value::Null);
        assert!(body.get("debug").is_none());
    }

    #[test]
    fn debug_is_additive() {
        let params: QueryParams = [("fields", "name")].into_iter().collect();
        let settings = QuerySettings {
            debug: true,
            ..QuerySettings::default()
        };
        let ctx = RequestContext::build(EntityType::Person, Endpoint::Detail, &params, &settings)
            .expect("context");

        let object = detail_object(&ctx, &record(json!({"name": "Ann"})), Duration::ZERO);
        assert_eq!(object["name"], "Ann");
        assert_eq!(object["debug"]["fields"], json!(["name"]));
        assert_eq!(object["debug"]["entity"], "person");
    }
}
