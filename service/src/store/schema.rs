//! Mapping from registry names onto the opencivicdata Postgres schema.
//!
//! Output fields become SQL expressions over the entity's row alias, and
//! relation hops become join conditions between a parent and child alias.
//! Every name that ends up in SQL text comes from these tables; request
//! values are always bound.

use ocd_query::EntityType;

/// How an output field is materialized as JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    /// A column of the entity's own table.
    Own(&'static str),
    /// The row of `table` whose id is in `fk` on the entity.
    One {
        table: &'static str,
        fk: &'static str,
    },
    /// All rows of `table` whose `fk` points at the entity.
    Many {
        table: &'static str,
        fk: &'static str,
    },
    /// Raw SQL; `{t}` is replaced by the entity alias.
    Expr(&'static str),
}

impl Column {
    /// SQL producing this field for the row aliased `alias`.
    #[must_use]
    pub fn render(&self, alias: &str) -> String {
        match *self {
            Self::Own(name) => format!("{alias}.{name}"),
            Self::One { table, fk } => format!(
                "(SELECT row_to_json(r) FROM {table} r WHERE r.id = {alias}.{fk})"
            ),
            Self::Many { table, fk } => format!(
                "(SELECT COALESCE(json_agg(row_to_json(r)), '[]'::json) FROM {table} r WHERE r.{fk} = {alias}.id)"
            ),
            Self::Expr(sql) => sql.replace("{t}", alias),
        }
    }
}

/// A relation hop from one table to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relation {
    pub from: &'static str,
    pub hop: &'static str,
    pub to: &'static str,
    /// Join condition; `{p}` is the parent alias, `{c}` the child alias.
    pub on: &'static str,
}

impl Relation {
    #[must_use]
    pub fn render(&self, parent: &str, child: &str) -> String {
        self.on.replace("{p}", parent).replace("{c}", child)
    }
}

const BILL: &str = "opencivicdata_bill";
const PERSON: &str = "opencivicdata_person";
const ORGANIZATION: &str = "opencivicdata_organization";
const EVENT: &str = "opencivicdata_event";
const VOTE: &str = "opencivicdata_voteevent";
const JURISDICTION: &str = "opencivicdata_jurisdiction";
const DIVISION: &str = "opencivicdata_division";
const SESSION: &str = "opencivicdata_legislativesession";
const SPONSORSHIP: &str = "opencivicdata_billsponsorship";
const MEMBERSHIP: &str = "opencivicdata_membership";
const POST: &str = "opencivicdata_post";
const DIVISION_GEOMETRY: &str = "opencivicdata_divisiongeometry";
const BOUNDARY: &str = "boundaries_boundary";
const BOUNDARY_SET: &str = "boundaries_boundaryset";
const PARTICIPANT: &str = "opencivicdata_eventparticipant";
const AGENDA_ITEM: &str = "opencivicdata_eventagendaitem";
const RELATED_ENTITY: &str = "opencivicdata_eventrelatedentity";
const PERSON_VOTE: &str = "opencivicdata_personvote";

/// Backing table of each entity type.
#[must_use]
pub const fn table_for(entity: EntityType) -> &'static str {
    match entity {
        EntityType::Bill => BILL,
        EntityType::Person => PERSON,
        EntityType::Organization => ORGANIZATION,
        EntityType::Event => EVENT,
        EntityType::Vote => VOTE,
        EntityType::Jurisdiction => JURISDICTION,
        EntityType::Division => DIVISION,
    }
}

use Column::{Expr, Many, One, Own};

const BILL_COLUMNS: &[(&str, Column)] = &[
    ("id", Own("id")),
    ("identifier", Own("identifier")),
    ("title", Own("title")),
    ("classification", Own("classification")),
    ("subject", Own("subject")),
    ("legislative_session", One { table: SESSION, fk: "legislative_session_id" }),
    ("from_organization_id", Own("from_organization_id")),
    ("from_organization", One { table: ORGANIZATION, fk: "from_organization_id" }),
    ("abstracts", Many { table: "opencivicdata_billabstract", fk: "bill_id" }),
    ("other_titles", Many { table: "opencivicdata_billtitle", fk: "bill_id" }),
    ("other_identifiers", Many { table: "opencivicdata_billidentifier", fk: "bill_id" }),
    ("actions", Many { table: "opencivicdata_billaction", fk: "bill_id" }),
    ("sponsorships", Many { table: SPONSORSHIP, fk: "bill_id" }),
    ("documents", Many { table: "opencivicdata_billdocument", fk: "bill_id" }),
    ("versions", Many { table: "opencivicdata_billversion", fk: "bill_id" }),
    ("sources", Many { table: "opencivicdata_billsource", fk: "bill_id" }),
    ("related_bills", Many { table: "opencivicdata_relatedbill", fk: "bill_id" }),
    ("created_at", Own("created_at")),
    ("updated_at", Own("updated_at")),
    ("extras", Own("extras")),
];

const PERSON_COLUMNS: &[(&str, Column)] = &[
    ("id", Own("id")),
    ("name", Own("name")),
    ("image", Own("image")),
    ("gender", Own("gender")),
    ("sort_name", Own("sort_name")),
    ("memberships", Many { table: MEMBERSHIP, fk: "person_id" }),
    ("family_name", Own("family_name")),
    ("given_name", Own("given_name")),
    ("summary", Own("summary")),
    ("national_identity", Own("national_identity")),
    ("biography", Own("biography")),
    ("birth_date", Own("birth_date")),
    ("death_date", Own("death_date")),
    ("other_identifiers", Many { table: "opencivicdata_personidentifier", fk: "person_id" }),
    ("other_names", Many { table: "opencivicdata_personname", fk: "person_id" }),
    ("links", Many { table: "opencivicdata_personlink", fk: "person_id" }),
    ("contact_details", Many { table: "opencivicdata_personcontactdetail", fk: "person_id" }),
    ("sources", Many { table: "opencivicdata_personsource", fk: "person_id" }),
    ("created_at", Own("created_at")),
    ("updated_at", Own("updated_at")),
    ("extras", Own("extras")),
];

const ORGANIZATION_COLUMNS: &[(&str, Column)] = &[
    ("id", Own("id")),
    ("name", Own("name")),
    ("image", Own("image")),
    ("classification", Own("classification")),
    ("jurisdiction_id", Own("jurisdiction_id")),
    ("parent_id", Own("parent_id")),
    ("parent", One { table: ORGANIZATION, fk: "parent_id" }),
    ("founding_date", Own("founding_date")),
    ("dissolution_date", Own("dissolution_date")),
    ("identifiers", Many { table: "opencivicdata_organizationidentifier", fk: "organization_id" }),
    ("other_names", Many { table: "opencivicdata_organizationname", fk: "organization_id" }),
    ("contact_details", Many { table: "opencivicdata_organizationcontactdetail", fk: "organization_id" }),
    ("links", Many { table: "opencivicdata_organizationlink", fk: "organization_id" }),
    ("sources", Many { table: "opencivicdata_organizationsource", fk: "organization_id" }),
    ("posts", Many { table: POST, fk: "organization_id" }),
    ("memberships", Many { table: MEMBERSHIP, fk: "organization_id" }),
    ("created_at", Own("created_at")),
    ("updated_at", Own("updated_at")),
    ("extras", Own("extras")),
];

const EVENT_COLUMNS: &[(&str, Column)] = &[
    ("id", Own("id")),
    ("name", Own("name")),
    ("classification", Own("classification")),
    ("start_time", Own("start_time")),
    ("timezone", Own("timezone")),
    ("description", Own("description")),
    ("end_time", Own("end_time")),
    ("all_day", Own("all_day")),
    ("status", Own("status")),
    ("location", One { table: "opencivicdata_eventlocation", fk: "location_id" }),
    ("jurisdiction_id", Own("jurisdiction_id")),
    ("participants", Many { table: PARTICIPANT, fk: "event_id" }),
    ("agenda", Many { table: AGENDA_ITEM, fk: "event_id" }),
    ("documents", Many { table: "opencivicdata_eventdocument", fk: "event_id" }),
    ("media", Many { table: "opencivicdata_eventmedia", fk: "event_id" }),
    ("links", Many { table: "opencivicdata_eventlink", fk: "event_id" }),
    ("sources", Many { table: "opencivicdata_eventsource", fk: "event_id" }),
    ("created_at", Own("created_at")),
    ("updated_at", Own("updated_at")),
    ("extras", Own("extras")),
];

const VOTE_COLUMNS: &[(&str, Column)] = &[
    ("id", Own("id")),
    ("identifier", Own("identifier")),
    ("start_date", Own("start_date")),
    ("motion_text", Own("motion_text")),
    ("result", Own("result")),
    ("bill_id", Own("bill_id")),
    ("motion_classification", Own("motion_classification")),
    ("end_date", Own("end_date")),
    ("organization_id", Own("organization_id")),
    ("organization", One { table: ORGANIZATION, fk: "organization_id" }),
    ("legislative_session", One { table: SESSION, fk: "legislative_session_id" }),
    ("bill", One { table: BILL, fk: "bill_id" }),
    ("counts", Many { table: "opencivicdata_votecount", fk: "vote_event_id" }),
    ("votes", Many { table: PERSON_VOTE, fk: "vote_event_id" }),
    ("sources", Many { table: "opencivicdata_votesource", fk: "vote_event_id" }),
    ("created_at", Own("created_at")),
    ("updated_at", Own("updated_at")),
    ("extras", Own("extras")),
];

const JURISDICTION_COLUMNS: &[(&str, Column)] = &[
    ("id", Own("id")),
    ("name", Own("name")),
    ("url", Own("url")),
    ("classification", Own("classification")),
    ("division_id", Own("division_id")),
    ("division", One { table: DIVISION, fk: "division_id" }),
    ("feature_flags", Own("feature_flags")),
    ("legislative_sessions", Many { table: SESSION, fk: "jurisdiction_id" }),
    ("organizations", Many { table: ORGANIZATION, fk: "jurisdiction_id" }),
    ("created_at", Own("created_at")),
    ("updated_at", Own("updated_at")),
    ("extras", Own("extras")),
];

const DIVISION_COLUMNS: &[(&str, Column)] = &[
    ("id", Own("id")),
    ("name", Own("name")),
    ("country", Own("country")),
    ("jurisdictions", Many { table: JURISDICTION, fk: "division_id" }),
    (
        "children",
        Expr(
            "(SELECT COALESCE(json_agg(c.id ORDER BY c.id), '[]'::json) \
             FROM opencivicdata_division c \
             WHERE left(c.id, length({t}.id) + 1) = {t}.id || '/' \
             AND length(c.id) > length({t}.id) + 1 \
             AND strpos(substr(c.id, length({t}.id) + 2), '/') = 0)",
        ),
    ),
    (
        "geometries",
        Expr(
            "(SELECT COALESCE(json_agg(json_build_object('boundary', json_build_object(\
             'set', json_build_object('name', bs.name, 'start_date', bs.start_date, 'end_date', bs.end_date), \
             'external_id', b.external_id, 'metadata', b.metadata, \
             'centroid', ST_AsGeoJSON(b.centroid)::json, 'extent', b.extent))), '[]'::json) \
             FROM opencivicdata_divisiongeometry g \
             JOIN boundaries_boundary b ON b.id = g.boundary_id \
             JOIN boundaries_boundaryset bs ON bs.slug = b.set_id \
             WHERE g.division_id = {t}.id)",
        ),
    ),
    ("redirect_id", Own("redirect_id")),
    ("created_at", Own("created_at")),
    ("updated_at", Own("updated_at")),
];

const fn columns_for(entity: EntityType) -> &'static [(&'static str, Column)] {
    match entity {
        EntityType::Bill => BILL_COLUMNS,
        EntityType::Person => PERSON_COLUMNS,
        EntityType::Organization => ORGANIZATION_COLUMNS,
        EntityType::Event => EVENT_COLUMNS,
        EntityType::Vote => VOTE_COLUMNS,
        EntityType::Jurisdiction => JURISDICTION_COLUMNS,
        EntityType::Division => DIVISION_COLUMNS,
    }
}

/// SQL mapping of an output field.
#[must_use]
pub fn column(entity: EntityType, field: &str) -> Option<Column> {
    columns_for(entity)
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, column)| *column)
}

const CURRENT: &str = "{c}.person_id = {p}.id \
     AND ({c}.end_date = '' OR {c}.end_date >= to_char(current_date, 'YYYY-MM-DD'))";

static RELATIONS: &[Relation] = &[
    Relation { from: BILL, hop: "legislative_session", to: SESSION, on: "{c}.id = {p}.legislative_session_id" },
    Relation { from: BILL, hop: "sponsorships", to: SPONSORSHIP, on: "{c}.bill_id = {p}.id" },
    Relation { from: SPONSORSHIP, hop: "person", to: PERSON, on: "{c}.id = {p}.person_id" },
    Relation { from: SPONSORSHIP, hop: "organization", to: ORGANIZATION, on: "{c}.id = {p}.organization_id" },
    Relation { from: PERSON, hop: "memberships", to: MEMBERSHIP, on: "{c}.person_id = {p}.id" },
    Relation { from: PERSON, hop: "current_memberships", to: MEMBERSHIP, on: CURRENT },
    Relation { from: MEMBERSHIP, hop: "organization", to: ORGANIZATION, on: "{c}.id = {p}.organization_id" },
    Relation { from: MEMBERSHIP, hop: "post", to: POST, on: "{c}.id = {p}.post_id" },
    Relation { from: POST, hop: "division", to: DIVISION, on: "{c}.id = {p}.division_id" },
    Relation { from: DIVISION, hop: "geometries", to: DIVISION_GEOMETRY, on: "{c}.division_id = {p}.id" },
    Relation { from: DIVISION_GEOMETRY, hop: "boundary", to: BOUNDARY, on: "{c}.id = {p}.boundary_id" },
    Relation { from: BOUNDARY, hop: "set", to: BOUNDARY_SET, on: "{c}.slug = {p}.set_id" },
    Relation { from: EVENT, hop: "participants", to: PARTICIPANT, on: "{c}.event_id = {p}.id" },
    Relation { from: EVENT, hop: "agenda", to: AGENDA_ITEM, on: "{c}.event_id = {p}.id" },
    Relation { from: AGENDA_ITEM, hop: "related_entities", to: RELATED_ENTITY, on: "{c}.agenda_item_id = {p}.id" },
    Relation { from: VOTE, hop: "legislative_session", to: SESSION, on: "{c}.id = {p}.legislative_session_id" },
    Relation { from: VOTE, hop: "votes", to: PERSON_VOTE, on: "{c}.vote_event_id = {p}.id" },
];

/// The declared hop named `hop` out of `table`.
#[must_use]
pub fn relation(table: &str, hop: &str) -> Option<&'static Relation> {
    RELATIONS.iter().find(|r| r.from == table && r.hop == hop)
}

/// Terminal fields that are not plain columns of their table.
const VIRTUAL: &[(&str, &str, &str)] = &[(
    PARTICIPANT,
    "entity_id",
    "COALESCE({t}.organization_id, {t}.person_id)",
)];

/// Array-typed columns, compared by overlap rather than equality.
const ARRAYS: &[(&str, &str)] = &[
    (BILL, "classification"),
    (BILL, "subject"),
    (VOTE, "motion_classification"),
];

/// SQL for a filter's terminal `field` on `table` aliased `alias`.
#[must_use]
pub fn terminal(table: &str, field: &str, alias: &str) -> String {
    VIRTUAL
        .iter()
        .find(|(t, f, _)| *t == table && *f == field)
        .map_or_else(
            || format!("{alias}.{field}"),
            |(_, _, sql)| sql.replace("{t}", alias),
        )
}

#[must_use]
pub fn is_array(table: &str, field: &str) -> bool {
    ARRAYS.iter().any(|(t, f)| *t == table && *f == field)
}
