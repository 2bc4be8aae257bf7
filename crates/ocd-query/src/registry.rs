//! Static field and filter declarations for every entity type.
//!
//! The registry is the single source of truth for which output fields exist,
//! which of them are projected by default, and which query parameters are
//! legal filters. Everything is `'static` data resolved with one `match` on
//! [`EntityType`]; there is no runtime registration.

use serde::Serialize;

use crate::entity::EntityType;

/// Shape of an output field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Scalar,
    Date,
    Object,
    List,
    Geometry,
}

/// When a field is projected without an explicit `fields` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inclusion {
    /// Projected by default on list and detail endpoints.
    Always,
    /// Projected by default on list endpoints only.
    ListDefault,
    /// Only projected when requested.
    Selectable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: FieldKind,
    pub inclusion: Inclusion,
}

/// How a bound filter value is compared against storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Comparison {
    Exact,
    DateExact,
    DateRange,
    GeoRadius,
    FullText,
    RelationalExists,
}

/// A legal filter parameter and the storage path it maps to.
///
/// `path` uses the `a__b__c` grammar: every segment but the last is a
/// relation hop, the last names the terminal field. `until` is only used by
/// date ranges and names a second field on the same terminal record; the
/// comparison then tests overlap with the `[path, until]` window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterDescriptor {
    pub key: &'static str,
    pub comparison: Comparison,
    pub path: &'static str,
    pub until: Option<&'static str>,
}

impl FilterDescriptor {
    /// Relation hops followed by the terminal field name.
    #[must_use]
    pub fn segments(&self) -> (Vec<&'static str>, &'static str) {
        let mut parts: Vec<&'static str> = self.path.split("__").collect();
        let field = parts.pop().unwrap_or(self.path);
        (parts, field)
    }
}

/// Whether the response being shaped is a list or a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    List,
    Detail,
}

/// Descriptor used for the reserved `q` parameter.
pub static FULL_TEXT: FilterDescriptor = FilterDescriptor {
    key: "q",
    comparison: Comparison::FullText,
    path: "",
    until: None,
};

const fn field(name: &'static str, kind: FieldKind, inclusion: Inclusion) -> FieldDescriptor {
    FieldDescriptor {
        name,
        kind,
        inclusion,
    }
}

const fn filter(key: &'static str, comparison: Comparison, path: &'static str) -> FilterDescriptor {
    FilterDescriptor {
        key,
        comparison,
        path,
        until: None,
    }
}

use Comparison::{DateExact, DateRange, Exact, GeoRadius, RelationalExists};
use FieldKind::{Date, Geometry, List, Object, Scalar};
use Inclusion::{Always, ListDefault, Selectable};

const BILL_FIELDS: &[FieldDescriptor] = &[
    field("id", Scalar, Always),
    field("identifier", Scalar, Always),
    field("title", Scalar, Always),
    field("classification", List, Always),
    field("subject", List, Always),
    field("legislative_session", Object, Selectable),
    field("from_organization_id", Scalar, Selectable),
    field("from_organization", Object, Selectable),
    field("abstracts", List, Selectable),
    field("other_titles", List, Selectable),
    field("other_identifiers", List, Selectable),
    field("actions", List, Selectable),
    field("sponsorships", List, Selectable),
    field("documents", List, Selectable),
    field("versions", List, Selectable),
    field("sources", List, Selectable),
    field("related_bills", List, Selectable),
    field("created_at", Date, Selectable),
    field("updated_at", Date, Selectable),
    field("extras", Object, Selectable),
];

const BILL_FILTERS: &[FilterDescriptor] = &[
    filter("identifier", Exact, "identifier"),
    filter("from_organization_id", Exact, "from_organization_id"),
    filter("classification", Exact, "classification"),
    filter("subject", Exact, "subject"),
    filter(
        "legislative_session__identifier",
        RelationalExists,
        "legislative_session__identifier",
    ),
    filter(
        "legislative_session__jurisdiction_id",
        RelationalExists,
        "legislative_session__jurisdiction_id",
    ),
    filter(
        "sponsorships__person__id",
        RelationalExists,
        "sponsorships__person__id",
    ),
    filter(
        "sponsorships__organization__id",
        RelationalExists,
        "sponsorships__organization__id",
    ),
    filter("sponsorships__name", RelationalExists, "sponsorships__name"),
    filter("created_at", DateRange, "created_at"),
    filter("updated_at", DateRange, "updated_at"),
];

const PERSON_FIELDS: &[FieldDescriptor] = &[
    field("id", Scalar, Always),
    field("name", Scalar, Always),
    field("image", Scalar, Always),
    field("gender", Scalar, Always),
    field("sort_name", Scalar, ListDefault),
    field("memberships", List, ListDefault),
    field("family_name", Scalar, Selectable),
    field("given_name", Scalar, Selectable),
    field("summary", Scalar, Selectable),
    field("national_identity", Scalar, Selectable),
    field("biography", Scalar, Selectable),
    field("birth_date", Date, Selectable),
    field("death_date", Date, Selectable),
    field("other_identifiers", List, Selectable),
    field("other_names", List, Selectable),
    field("links", List, Selectable),
    field("contact_details", List, Selectable),
    field("sources", List, Selectable),
    field("created_at", Date, Selectable),
    field("updated_at", Date, Selectable),
    field("extras", Object, Selectable),
];

const PERSON_FILTERS: &[FilterDescriptor] = &[
    filter("name", Exact, "name"),
    filter("gender", Exact, "gender"),
    filter("birth_date", DateExact, "birth_date"),
    filter("death_date", DateExact, "death_date"),
    filter("created_at", DateRange, "created_at"),
    filter("updated_at", DateRange, "updated_at"),
    filter(
        "member_of",
        RelationalExists,
        "current_memberships__organization__id",
    ),
    filter(
        "ever_member_of",
        RelationalExists,
        "memberships__organization__id",
    ),
    filter(
        "location",
        GeoRadius,
        "current_memberships__post__division__geometries__boundary__shape",
    ),
];

const ORGANIZATION_FIELDS: &[FieldDescriptor] = &[
    field("id", Scalar, Always),
    field("name", Scalar, Always),
    field("image", Scalar, Always),
    field("classification", Scalar, Always),
    field("jurisdiction_id", Scalar, ListDefault),
    field("parent_id", Scalar, ListDefault),
    field("parent", Object, Selectable),
    field("founding_date", Date, Selectable),
    field("dissolution_date", Date, Selectable),
    field("identifiers", List, Selectable),
    field("other_names", List, Selectable),
    field("contact_details", List, Selectable),
    field("links", List, Selectable),
    field("sources", List, Selectable),
    field("posts", List, Selectable),
    field("memberships", List, Selectable),
    field("created_at", Date, Selectable),
    field("updated_at", Date, Selectable),
    field("extras", Object, Selectable),
];

const ORGANIZATION_FILTERS: &[FilterDescriptor] = &[
    filter("classification", Exact, "classification"),
    filter("jurisdiction_id", Exact, "jurisdiction_id"),
    filter("parent_id", Exact, "parent_id"),
    filter("founding_date", DateExact, "founding_date"),
    filter("dissolution_date", DateExact, "dissolution_date"),
    filter("created_at", DateRange, "created_at"),
    filter("updated_at", DateRange, "updated_at"),
];

const EVENT_FIELDS: &[FieldDescriptor] = &[
    field("id", Scalar, Always),
    field("name", Scalar, Always),
    field("classification", Scalar, Always),
    field("start_time", Date, Always),
    field("timezone", Scalar, Always),
    field("description", Scalar, ListDefault),
    field("end_time", Date, ListDefault),
    field("all_day", Scalar, ListDefault),
    field("status", Scalar, ListDefault),
    field("location", Object, Selectable),
    field("jurisdiction_id", Scalar, Selectable),
    field("participants", List, Selectable),
    field("agenda", List, Selectable),
    field("documents", List, Selectable),
    field("media", List, Selectable),
    field("links", List, Selectable),
    field("sources", List, Selectable),
    field("created_at", Date, Selectable),
    field("updated_at", Date, Selectable),
    field("extras", Object, Selectable),
];

const EVENT_FILTERS: &[FilterDescriptor] = &[
    filter("jurisdiction_id", Exact, "jurisdiction_id"),
    filter("classification", Exact, "classification"),
    filter("status", Exact, "status"),
    filter("participant_id", RelationalExists, "participants__entity_id"),
    filter(
        "agenda__related_entities__bill_id",
        RelationalExists,
        "agenda__related_entities__bill_id",
    ),
    filter(
        "agenda__related_entities__organization_id",
        RelationalExists,
        "agenda__related_entities__organization_id",
    ),
    filter(
        "agenda__related_entities__person_id",
        RelationalExists,
        "agenda__related_entities__person_id",
    ),
    filter(
        "agenda__related_entities__vote_id",
        RelationalExists,
        "agenda__related_entities__vote_id",
    ),
    filter("when", DateRange, "start_time"),
    filter("created_at", DateRange, "created_at"),
    filter("updated_at", DateRange, "updated_at"),
];

const VOTE_FIELDS: &[FieldDescriptor] = &[
    field("id", Scalar, Always),
    field("identifier", Scalar, Always),
    field("start_date", Date, Always),
    field("motion_text", Scalar, Always),
    field("result", Scalar, ListDefault),
    field("bill_id", Scalar, ListDefault),
    field("motion_classification", List, Selectable),
    field("end_date", Date, Selectable),
    field("organization_id", Scalar, Selectable),
    field("organization", Object, Selectable),
    field("legislative_session", Object, Selectable),
    field("bill", Object, Selectable),
    field("counts", List, Selectable),
    field("votes", List, Selectable),
    field("sources", List, Selectable),
    field("created_at", Date, Selectable),
    field("updated_at", Date, Selectable),
    field("extras", Object, Selectable),
];

const VOTE_FILTERS: &[FilterDescriptor] = &[
    filter("bill_id", Exact, "bill_id"),
    filter("organization_id", Exact, "organization_id"),
    filter("result", Exact, "result"),
    filter(
        "legislative_session__identifier",
        RelationalExists,
        "legislative_session__identifier",
    ),
    filter("votes__voter_id", RelationalExists, "votes__voter_id"),
    filter("start_date", DateExact, "start_date"),
    filter("created_at", DateRange, "created_at"),
    filter("updated_at", DateRange, "updated_at"),
];

const JURISDICTION_FIELDS: &[FieldDescriptor] = &[
    field("id", Scalar, Always),
    field("name", Scalar, Always),
    field("url", Scalar, Always),
    field("classification", Scalar, Always),
    field("division_id", Scalar, Selectable),
    field("division", Object, Selectable),
    field("feature_flags", List, Selectable),
    field("legislative_sessions", List, Selectable),
    field("organizations", List, Selectable),
    field("created_at", Date, Selectable),
    field("updated_at", Date, Selectable),
    field("extras", Object, Selectable),
];

const JURISDICTION_FILTERS: &[FilterDescriptor] = &[
    filter("classification", Exact, "classification"),
    filter("division_id", Exact, "division_id"),
    filter("created_at", DateRange, "created_at"),
    filter("updated_at", DateRange, "updated_at"),
];

const DIVISION_FIELDS: &[FieldDescriptor] = &[
    field("id", Scalar, Always),
    field("name", Scalar, Always),
    field("country", Scalar, Always),
    field("jurisdictions", List, Always),
    field("children", List, Always),
    field("geometries", Geometry, Always),
    field("redirect_id", Scalar, Selectable),
    field("created_at", Date, Selectable),
    field("updated_at", Date, Selectable),
];

const DIVISION_FILTERS: &[FilterDescriptor] = &[
    filter("country", Exact, "country"),
    FilterDescriptor {
        key: "date",
        comparison: DateRange,
        path: "geometries__boundary__set__start_date",
        until: Some("end_date"),
    },
    filter("location", GeoRadius, "geometries__boundary__shape"),
];

/// Output fields registered for `entity`.
#[must_use]
pub const fn fields_for(entity: EntityType) -> &'static [FieldDescriptor] {
    match entity {
        EntityType::Bill => BILL_FIELDS,
        EntityType::Person => PERSON_FIELDS,
        EntityType::Organization => ORGANIZATION_FIELDS,
        EntityType::Event => EVENT_FIELDS,
        EntityType::Vote => VOTE_FIELDS,
        EntityType::Jurisdiction => JURISDICTION_FIELDS,
        EntityType::Division => DIVISION_FIELDS,
    }
}

/// Filter parameters registered for `entity`.
#[must_use]
pub const fn filters_for(entity: EntityType) -> &'static [FilterDescriptor] {
    match entity {
        EntityType::Bill => BILL_FILTERS,
        EntityType::Person => PERSON_FILTERS,
        EntityType::Organization => ORGANIZATION_FILTERS,
        EntityType::Event => EVENT_FILTERS,
        EntityType::Vote => VOTE_FILTERS,
        EntityType::Jurisdiction => JURISDICTION_FILTERS,
        EntityType::Division => DIVISION_FILTERS,
    }
}

/// Storage fields the `q` parameter searches over.
#[must_use]
pub const fn search_fields_for(entity: EntityType) -> &'static [&'static str] {
    match entity {
        EntityType::Bill => &["title", "identifier"],
        EntityType::Person => &["name", "sort_name"],
        EntityType::Organization | EntityType::Jurisdiction | EntityType::Division => &["name"],
        EntityType::Event => &["name", "description"],
        EntityType::Vote => &["motion_text", "identifier"],
    }
}

/// Fields accepted by the `sort` parameter.
#[must_use]
pub const fn sortable_for(entity: EntityType) -> &'static [&'static str] {
    match entity {
        EntityType::Bill => &["id", "identifier", "title", "created_at", "updated_at"],
        EntityType::Person => &[
            "id",
            "name",
            "sort_name",
            "birth_date",
            "created_at",
            "updated_at",
        ],
        EntityType::Organization => &["id", "name", "founding_date", "created_at", "updated_at"],
        EntityType::Event => &["id", "name", "start_time", "created_at", "updated_at"],
        EntityType::Vote => &["id", "identifier", "start_date", "created_at", "updated_at"],
        EntityType::Jurisdiction => &["id", "name", "created_at", "updated_at"],
        EntityType::Division => &["id", "name"],
    }
}

/// Ordering applied when no `sort` parameter is given.
#[must_use]
pub const fn default_order(entity: EntityType) -> &'static str {
    match entity {
        EntityType::Person => "sort_name",
        EntityType::Event => "start_time",
        _ => "id",
    }
}

/// Look up a filter by its exact parameter key.
#[must_use]
pub fn find_filter(entity: EntityType, key: &str) -> Option<&'static FilterDescriptor> {
    filters_for(entity).iter().find(|f| f.key == key)
}

/// Look up a registered output field by name.
#[must_use]
pub fn find_field(entity: EntityType, name: &str) -> Option<&'static FieldDescriptor> {
    fields_for(entity).iter().find(|f| f.name == name)
}

/// The geo-radius filter for `entity`, fed by the `lat`/`lon` pair.
#[must_use]
pub fn geo_filter(entity: EntityType) -> Option<&'static FilterDescriptor> {
    filters_for(entity)
        .iter()
        .find(|f| f.comparison == Comparison::GeoRadius)
}

/// Whether `lat`/`lon` are accepted for `entity`.
#[must_use]
pub fn has_geo_filter(entity: EntityType) -> bool {
    geo_filter(entity).is_some()
}

/// Fields projected when the request carries no `fields` parameter.
#[must_use]
pub fn default_fields(entity: EntityType, endpoint: Endpoint) -> Vec<&'static FieldDescriptor> {
    fields_for(entity)
        .iter()
        .filter(|f| match f.inclusion {
            Inclusion::Always => true,
            Inclusion::ListDefault => endpoint == Endpoint::List,
            Inclusion::Selectable => false,
        })
        .collect()
}
