//! Filter compilation.
//!
//! Each validated binding becomes one [`Predicate`]; a request's predicates
//! are combined with logical AND. Compilation is pure: the result is an
//! opaque value that store implementations interpret.

use chrono::NaiveDate;
use serde::Serialize;

use crate::params::{Binding, BoundValue};
use crate::registry::{self, Comparison};
use crate::entity::EntityType;

/// Tunables the compiler bakes into predicates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompileOptions {
    /// Distance around a point that still counts as a geo match.
    pub geo_radius_meters: f64,
    /// Full-text rank a record must exceed to match.
    pub search_min_rank: f32,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            geo_radius_meters: 100.0,
            search_min_rank: 0.0,
        }
    }
}

/// Test applied to the terminal field of a (possibly relational) path.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "test", rename_all = "snake_case")]
pub enum FieldTest {
    /// Field equals any of `values`; list-valued fields match on any element.
    Equals {
        field: &'static str,
        values: Vec<String>,
    },
    /// Field's date part is `day`.
    OnDate { field: &'static str, day: NaiveDate },
    /// Field's date falls within `[start, end]`. With `until`, the
    /// `[field, until]` window overlaps `[start, end]` instead (a missing
    /// `until` is open-ended).
    Within {
        field: &'static str,
        until: Option<&'static str>,
        start: NaiveDate,
        end: NaiveDate,
    },
    /// Geometry contains the point or lies within `radius_meters` of it.
    Near {
        field: &'static str,
        lat: f64,
        lon: f64,
        radius_meters: f64,
    },
}

/// Compiled, store-agnostic filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Predicate {
    /// Every child must hold. An empty list matches everything.
    All { predicates: Vec<Predicate> },
    /// At least one record reached by following `relations` from the
    /// entity satisfies `test`. No relations means the entity itself.
    Field {
        relations: Vec<&'static str>,
        test: FieldTest,
    },
    /// Search rank over `fields` for `query` exceeds `min_rank`.
    Search {
        fields: &'static [&'static str],
        query: String,
        min_rank: f32,
    },
}

impl Predicate {
    /// The predicate that matches every record.
    #[must_use]
    pub const fn everything() -> Self {
        Self::All {
            predicates: Vec::new(),
        }
    }

    /// Whether this predicate is the trivial match-all.
    #[must_use]
    pub fn is_everything(&self) -> bool {
        matches!(self, Self::All { predicates } if predicates.iter().all(Self::is_everything))
    }
}

/// Compile `bindings` into one AND-combined predicate.
#[must_use]
pub fn compile(entity: EntityType, bindings: &[Binding], options: &CompileOptions) -> Predicate {
    let predicates: Vec<Predicate> = bindings
        .iter()
        .filter_map(|binding| compile_binding(entity, binding, options))
        .collect();

    match <[Predicate; 1]>::try_from(predicates) {
        Ok([single]) => single,
        Err(predicates) => Predicate::All { predicates },
    }
}

fn compile_binding(
    entity: EntityType,
    binding: &Binding,
    options: &CompileOptions,
) -> Option<Predicate> {
    let filter = binding.filter;
    let (relations, field) = filter.segments();

    let test = match (&binding.value, filter.comparison) {
        (BoundValue::Search(query), Comparison::FullText) => {
            return Some(Predicate::Search {
                fields: registry::search_fields_for(entity),
                query: query.clone(),
                min_rank: options.search_min_rank,
            });
        }
        (BoundValue::Text(values), Comparison::Exact | Comparison::RelationalExists) => {
            FieldTest::Equals {
                field,
                values: values.clone(),
            }
        }
        (BoundValue::Day(day), Comparison::DateExact) => FieldTest::OnDate { field, day: *day },
        (BoundValue::Span { start, end }, Comparison::DateRange) => FieldTest::Within {
            field,
            until: filter.until,
            start: *start,
            end: *end,
        },
        (BoundValue::Point { lat, lon }, Comparison::GeoRadius) => FieldTest::Near {
            field,
            lat: *lat,
            lon: *lon,
            radius_meters: options.geo_radius_meters,
        },
        (value, comparison) => {
            // Bindings come only from `validate_filters`, which pairs values with their comparison.
            tracing::warn!(key = filter.key, ?comparison, ?value, "skipping mismatched binding");
            return None;
        }
    };

    Some(Predicate::Field { relations, test })
}
