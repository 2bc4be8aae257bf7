//! Per-request context.
//!
//! A [`RequestContext`] is built once at request entry from the raw query
//! parameters and then passed by reference through compile, execute and
//! project. It is never mutated after construction.

use crate::compiler::CompileOptions;
use crate::entity::EntityType;
use crate::error::QueryError;
use crate::params::{
    self, Binding, QueryParams, FIELDS_KEY, PAGE_KEY, PER_PAGE_KEY, SORT_KEY,
};
use crate::projector;
use crate::registry::{self, Endpoint, FieldDescriptor};
use crate::store::Ordering;

/// Query tunables shared by every request.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySettings {
    pub default_page_size: u32,
    pub max_page_size: u32,
    pub geo_radius_meters: f64,
    pub search_min_rank: f32,
    /// Attach a `debug` object to responses.
    pub debug: bool,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
            geo_radius_meters: 100.0,
            search_min_rank: 0.0,
            debug: false,
        }
    }
}

impl QuerySettings {
    #[must_use]
    pub const fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            geo_radius_meters: self.geo_radius_meters,
            search_min_rank: self.search_min_rank,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// 1-based page number.
    pub page: u32,
    pub per_page: u32,
}

impl Pagination {
    #[must_use]
    pub const fn offset(self) -> u64 {
        self.page.saturating_sub(1) as u64 * self.per_page as u64
    }
}

/// Everything resolved from one request's parameters.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub entity: EntityType,
    pub endpoint: Endpoint,
    pub bindings: Vec<Binding>,
    pub fields: Vec<&'static FieldDescriptor>,
    pub pagination: Pagination,
    pub order: Ordering,
    pub options: CompileOptions,
    pub debug: bool,
}

impl RequestContext {
    /// Validate `params` for `entity` and resolve the response shape.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::InvalidParameter` for unknown filter keys, bad
    /// filter values, bad pagination or ordering, and any key other than
    /// `fields` on a detail endpoint.
    pub fn build(
        entity: EntityType,
        endpoint: Endpoint,
        params: &QueryParams,
        settings: &QuerySettings,
    ) -> Result<Self, QueryError> {
        let fields = projector::resolve_fields(entity, endpoint, params.last(FIELDS_KEY));

        let (bindings, pagination, order) = match endpoint {
            Endpoint::Detail => {
                if let Some(key) = params.keys().into_iter().find(|k| *k != FIELDS_KEY) {
                    return Err(QueryError::invalid(
                        key,
                        "detail endpoints only accept 'fields'",
                    ));
                }
                (
                    Vec::new(),
                    Pagination {
                        page: 1,
                        per_page: 1,
                    },
                    default_ordering(entity),
                )
            }
            Endpoint::List => (
                params::validate_filters(entity, params)?,
                pagination(params, settings)?,
                ordering(entity, params)?,
            ),
        };

        Ok(Self {
            entity,
            endpoint,
            bindings,
            fields,
            pagination,
            order,
            options: settings.compile_options(),
            debug: settings.debug,
        })
    }

    /// Names of the projected fields, in output order.
    #[must_use]
    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.name).collect()
    }

    /// Parameter keys that became filter bindings.
    #[must_use]
    pub fn filter_keys(&self) -> Vec<&'static str> {
        self.bindings.iter().map(|b| b.filter.key).collect()
    }
}

fn pagination(params: &QueryParams, settings: &QuerySettings) -> Result<Pagination, QueryError> {
    let page = positive(params, PAGE_KEY)?.unwrap_or(1);
    let per_page = positive(params, PER_PAGE_KEY)?
        .unwrap_or(settings.default_page_size)
        .min(settings.max_page_size)
        .max(1);
    Ok(Pagination { page, per_page })
}

fn positive(params: &QueryParams, key: &str) -> Result<Option<u32>, QueryError> {
    let Some(raw) = params.last(key).map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    match raw.parse::<u32>() {
        Ok(n) if n >= 1 => Ok(Some(n)),
        _ => Err(QueryError::invalid(
            key,
            format!("'{raw}' is not a positive integer"),
        )),
    }
}

fn ordering(entity: EntityType, params: &QueryParams) -> Result<Ordering, QueryError> {
    let Some(raw) = params.last(SORT_KEY).map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(default_ordering(entity));
    };
    let (name, descending) = raw
        .strip_prefix('-')
        .map_or((raw, false), |name| (name, true));

    registry::sortable_for(entity)
        .iter()
        .copied()
        .find(|f| *f == name)
        .map(|field| Ordering { field, descending })
        .ok_or_else(|| QueryError::invalid(SORT_KEY, format!("cannot sort {entity} by '{name}'")))
}

const fn default_ordering(entity: EntityType) -> Ordering {
    Ordering {
        field: registry::default_order(entity),
        descending: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(
        entity: EntityType,
        endpoint: Endpoint,
        pairs: &[(&str, &str)],
    ) -> Result<RequestContext, QueryError> {
        let params: QueryParams = pairs.iter().copied().collect();
        RequestContext::build(entity, endpoint, &params, &QuerySettings::default())
    }

    fn rejected_key(result: Result<RequestContext, QueryError>) -> String {
        match result {
            Err(QueryError::InvalidParameter { key, .. }) => key,
            other => panic!("expected InvalidParameter, got {other:?}"),
        }
    }

    #[test]
    fn defaults() {
        let ctx = build(EntityType::Person, Endpoint::List, &[]).expect("context");
        assert!(ctx.bindings.is_empty());
        assert_eq!(
            ctx.pagination,
            Pagination {
                page: 1,
                per_page: 10
            }
        );
        assert_eq!(ctx.order.field, "sort_name");
        assert!(!ctx.order.descending);
        assert!(!ctx.debug);
    }

    #[test]
    fn pagination_boundaries() {
        let cases = [
            ("page", "3", true),
            ("page", "1", true),
            ("page", "0", false),
            ("page", "-1", false),
            ("page", "two", false),
            ("per_page", "1", true),
            ("per_page", "0", false),
            ("per_page", "1.5", false),
        ];

        for (key, value, should_pass) in cases {
            let result = build(EntityType::Bill, Endpoint::List, &[(key, value)]);
            assert_eq!(result.is_ok(), should_pass, "{key}={value}");
        }
    }

    #[test]
    fn per_page_is_clamped_and_offset_follows() {
        let ctx = build(
            EntityType::Bill,
            Endpoint::List,
            &[("per_page", "1000"), ("page", "3")],
        )
        .expect("context");
        assert_eq!(ctx.pagination.per_page, 100);
        assert_eq!(ctx.pagination.offset(), 200);
    }

    #[test]
    fn sort_accepts_registered_fields() {
        let ctx = build(EntityType::Bill, Endpoint::List, &[("sort", "-updated_at")])
            .expect("context");
        assert_eq!(ctx.order.field, "updated_at");
        assert!(ctx.order.descending);

        let key = rejected_key(build(EntityType::Bill, Endpoint::List, &[("sort", "sponsorships")]));
        assert_eq!(key, "sort");
    }

    #[test]
    fn detail_accepts_only_fields() {
        let ctx = build(EntityType::Person, Endpoint::Detail, &[("fields", "name")])
            .expect("context");
        assert_eq!(ctx.field_names(), vec!["name"]);

        let key = rejected_key(build(EntityType::Person, Endpoint::Detail, &[("gender", "f")]));
        assert_eq!(key, "gender");
    }

    #[test]
    fn unknown_filter_fails_the_whole_request() {
        let key = rejected_key(build(
            EntityType::Event,
            Endpoint::List,
            &[("fields", "id"), ("bogus", "1")],
        ));
        assert_eq!(key, "bogus");
    }

    #[test]
    fn filter_keys_follow_binding_order() {
        let ctx = build(
            EntityType::Person,
            Endpoint::List,
            &[("q", "smith"), ("gender", "f"), ("lat", "1"), ("lon", "2")],
        )
        .expect("context");
        assert_eq!(ctx.filter_keys(), vec!["gender", "location", "q"]);
    }
}
