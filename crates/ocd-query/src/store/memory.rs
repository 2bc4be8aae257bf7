use std::cmp::Ordering as CmpOrdering;
use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde_json::Value;

use super::{CivicStore, Ordering, Record, StoreError, StoreQuery};
use crate::compiler::{FieldTest, Predicate};
use crate::entity::EntityType;
use crate::params::parse_day;

const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// Relation view over `memberships` restricted to memberships still running.
const CURRENT_MEMBERSHIPS: &str = "current_memberships";

/// Store that evaluates predicates over in-memory JSON documents.
///
/// Records are stored in output shape: nested objects and arrays double as
/// relations, so `sponsorships__person__id` walks
/// `record.sponsorships[*].person.id`.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<EntityType, Vec<Record>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record. The record must be a JSON object with a string `id`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Malformed` if `record` is not an object with an id.
    pub fn insert(&self, entity: EntityType, record: Value) -> Result<(), StoreError> {
        let Value::Object(record) = record else {
            return Err(StoreError::Malformed(format!(
                "{entity} record is not an object"
            )));
        };
        if !record.get("id").is_some_and(Value::is_string) {
            return Err(StoreError::Malformed(format!("{entity} record has no id")));
        }

        self.records
            .write()
            .map_err(|_| StoreError::Unavailable("record lock poisoned".into()))?
            .entry(entity)
            .or_default()
            .push(record);
        Ok(())
    }

    /// Load a fixture document of the form `{"bills": [...], "people": [...]}`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Malformed` for unknown collections or bad records.
    pub fn load(&self, document: Value) -> Result<(), StoreError> {
        let Value::Object(collections) = document else {
            return Err(StoreError::Malformed("fixture is not an object".into()));
        };
        for (name, records) in collections {
            let entity = EntityType::from_plural(&name)
                .ok_or_else(|| StoreError::Malformed(format!("unknown collection '{name}'")))?;
            let Value::Array(records) = records else {
                return Err(StoreError::Malformed(format!("'{name}' is not a list")));
            };
            for record in records {
                self.insert(entity, record)?;
            }
        }
        Ok(())
    }

    fn snapshot(&self, entity: EntityType) -> Result<Vec<Record>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::Unavailable("record lock poisoned".into()))?;
        Ok(records.get(&entity).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl CivicStore for MemoryStore {
    async fn find(&self, query: &StoreQuery) -> Result<Vec<Record>, StoreError> {
        let today = Utc::now().date_naive();
        let mut matched: Vec<Record> = self
            .snapshot(query.entity)?
            .into_iter()
            .filter(|record| {
                let root = [Node::Record(record)];
                evaluate(&query.predicate, &root, today)
            })
            .collect();

        matched.sort_by(|a, b| compare_records(a, b, query.order));

        let offset = usize::try_from(query.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.limit).unwrap_or(usize::MAX);
        Ok(matched.into_iter().skip(offset).take(limit).collect())
    }

    async fn find_by_id(
        &self,
        entity: EntityType,
        id: &str,
        _columns: &[&'static str],
    ) -> Result<Option<Record>, StoreError> {
        Ok(self
            .snapshot(entity)?
            .into_iter()
            .find(|record| record.get("id").and_then(Value::as_str) == Some(id)))
    }
}

/// A position during relation traversal: the root record or a nested value.
#[derive(Clone, Copy)]
enum Node<'a> {
    Record(&'a Record),
    Value(&'a Value),
}

impl<'a> Node<'a> {
    fn get(self, key: &str) -> Option<&'a Value> {
        match self {
            Node::Record(record) => record.get(key),
            Node::Value(value) => value.get(key),
        }
    }
}

fn evaluate(predicate: &Predicate, root: &[Node<'_>], today: NaiveDate) -> bool {
    match predicate {
        Predicate::All { predicates } => predicates.iter().all(|p| evaluate(p, root, today)),
        Predicate::Field { relations, test } => {
            let mut nodes = root.to_vec();
            for hop in relations {
                nodes = follow(&nodes, hop, today);
            }
            nodes.iter().any(|node| field_matches(*node, test))
        }
        Predicate::Search {
            fields,
            query,
            min_rank,
        } => root
            .first()
            .is_some_and(|node| search_rank(*node, fields, query) > *min_rank),
    }
}

/// Step every node across one relation, fanning out over arrays.
fn follow<'a>(nodes: &[Node<'a>], hop: &str, today: NaiveDate) -> Vec<Node<'a>> {
    let (key, current_only) = if hop == CURRENT_MEMBERSHIPS {
        ("memberships", true)
    } else {
        (hop, false)
    };

    let mut next = Vec::new();
    for node in nodes {
        match node.get(key) {
            Some(Value::Array(items)) => next.extend(
                items
                    .iter()
                    .filter(|item| !current_only || is_current(item, today))
                    .map(Node::Value),
            ),
            Some(value @ Value::Object(_)) => next.push(Node::Value(value)),
            _ => {}
        }
    }
    next
}

fn is_current(membership: &Value, today: NaiveDate) -> bool {
    match membership.get("end_date") {
        None | Some(Value::Null) => true,
        Some(Value::String(end)) if end.is_empty() => true,
        Some(end) => day_of(end).is_some_and(|end| end >= today),
    }
}

fn field_matches(node: Node<'_>, test: &FieldTest) -> bool {
    match test {
        FieldTest::Equals { field, values } => node.get(field).is_some_and(|value| match value {
            Value::Array(items) => items.iter().any(|item| equals_any(item, values)),
            other => equals_any(other, values),
        }),
        FieldTest::OnDate { field, day } => {
            node.get(field).and_then(day_of).is_some_and(|d| d == *day)
        }
        FieldTest::Within {
            field,
            until: None,
            start,
            end,
        } => node
            .get(field)
            .and_then(day_of)
            .is_some_and(|d| *start <= d && d <= *end),
        FieldTest::Within {
            field,
            until: Some(until),
            start,
            end,
        } => {
            let opens_in_time = node.get(field).and_then(day_of).map_or(true, |d| d <= *end);
            let still_open = node.get(until).and_then(day_of).map_or(true, |d| d >= *start);
            opens_in_time && still_open
        }
        FieldTest::Near {
            field,
            lat,
            lon,
            radius_meters,
        } => node
            .get(field)
            .is_some_and(|geometry| near(geometry, (*lon, *lat), *radius_meters)),
    }
}

fn equals_any(value: &Value, candidates: &[String]) -> bool {
    match value {
        Value::String(s) => candidates.iter().any(|c| c == s),
        Value::Number(n) => candidates.iter().any(|c| *c == n.to_string()),
        Value::Bool(b) => candidates.iter().any(|c| *c == b.to_string()),
        _ => false,
    }
}

/// Calendar day of a stored date or timestamp string.
fn day_of(value: &Value) -> Option<NaiveDate> {
    let raw = value.as_str()?;
    parse_day(raw).or_else(|| raw.get(..10).and_then(parse_day))
}

/// Share of query terms found in the search fields, in `[0, 1]`.
#[allow(clippy::cast_precision_loss)]
fn search_rank(node: Node<'_>, fields: &[&str], query: &str) -> f32 {
    let terms: Vec<String> = tokens(query).collect();
    if terms.is_empty() {
        return 0.0;
    }

    let haystack: Vec<String> = fields
        .iter()
        .filter_map(|f| node.get(f).and_then(Value::as_str))
        .flat_map(tokens)
        .collect();

    let hits = terms.iter().filter(|t| haystack.contains(t)).count();
    hits as f32 / terms.len() as f32
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

fn compare_records(a: &Record, b: &Record, order: Ordering) -> CmpOrdering {
    let (x, y) = (a.get(order.field), b.get(order.field));
    let both_present = x.is_some_and(|v| !v.is_null()) && y.is_some_and(|v| !v.is_null());
    // Nulls stay last in both directions.
    let primary = if order.descending && both_present {
        compare_values(y, x)
    } else {
        compare_values(x, y)
    };
    primary.then_with(|| compare_values(a.get("id"), b.get("id")))
}

/// Total order over stored scalars; missing and null sort last.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> CmpOrdering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => CmpOrdering::Equal,
        (None, Some(_)) => CmpOrdering::Greater,
        (Some(_), None) => CmpOrdering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(CmpOrdering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

// --- Geometry ---------------------------------------------------------------

type Point = (f64, f64);

/// Whether a GeoJSON geometry contains `point` or lies within `radius` of it.
fn near(geometry: &Value, point: Point, radius_meters: f64) -> bool {
    let Some(kind) = geometry.get("type").and_then(Value::as_str) else {
        return false;
    };
    let coordinates = geometry.get("coordinates");

    match kind {
        "Point" => coordinates
            .and_then(position)
            .is_some_and(|p| haversine(p, point) <= radius_meters),
        "Polygon" => coordinates
            .and_then(polygon)
            .is_some_and(|rings| polygon_near(&rings, point, radius_meters)),
        "MultiPolygon" => coordinates.and_then(Value::as_array).is_some_and(|polys| {
            polys
                .iter()
                .filter_map(polygon)
                .any(|rings| polygon_near(&rings, point, radius_meters))
        }),
        "GeometryCollection" => geometry
            .get("geometries")
            .and_then(Value::as_array)
            .is_some_and(|parts| parts.iter().any(|g| near(g, point, radius_meters))),
        _ => false,
    }
}

fn position(value: &Value) -> Option<Point> {
    let pair = value.as_array()?;
    Some((pair.first()?.as_f64()?, pair.get(1)?.as_f64()?))
}

fn polygon(value: &Value) -> Option<Vec<Vec<Point>>> {
    value
        .as_array()?
        .iter()
        .map(|ring| ring.as_array()?.iter().map(position).collect())
        .collect()
}

fn polygon_near(rings: &[Vec<Point>], point: Point, radius_meters: f64) -> bool {
    let Some((outer, holes)) = rings.split_first() else {
        return false;
    };
    let inside = ring_contains(outer, point) && !holes.iter().any(|h| ring_contains(h, point));
    inside
        || rings.iter().any(|ring| {
            ring.windows(2).any(|edge| match edge {
                [a, b] => haversine(closest_on_segment(*a, *b, point), point) <= radius_meters,
                _ => false,
            })
        })
}

/// Nearest point to `p` on segment `a`-`b`, projected in a local
/// equirectangular frame so longitude is scaled by the point's latitude.
fn closest_on_segment(a: Point, b: Point, p: Point) -> Point {
    let scale = p.1.to_radians().cos();
    let (dx, dy) = ((b.0 - a.0) * scale, b.1 - a.1);
    let length_sq = dx.mul_add(dx, dy * dy);
    if length_sq <= f64::EPSILON {
        return a;
    }
    let t = ((p.0 - a.0) * scale).mul_add(dx, (p.1 - a.1) * dy) / length_sq;
    let t = t.clamp(0.0, 1.0);
    (t.mul_add(b.0 - a.0, a.0), t.mul_add(b.1 - a.1, a.1))
}

/// Even-odd ray casting on (lon, lat) pairs.
fn ring_contains(ring: &[Point], (x, y): Point) -> bool {
    let mut inside = false;
    let mut j = ring.len().wrapping_sub(1);
    for (i, &(xi, yi)) in ring.iter().enumerate() {
        let Some(&(xj, yj)) = ring.get(j) else {
            j = i;
            continue;
        };
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn haversine((lon1, lat1): Point, (lon2, lat2): Point) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();
    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * a.sqrt().asin()
}
