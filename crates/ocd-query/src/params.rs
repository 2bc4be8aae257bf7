//! Query-parameter validation.
//!
//! Turns the raw `(key, value)` pairs of a request into typed filter
//! bindings. Reserved response-shaping keys are split off first; every other
//! key must match a registered [`FilterDescriptor`] or the request fails with
//! [`QueryError::InvalidParameter`] before any query runs.

use chrono::{DateTime, NaiveDate};

use crate::entity::EntityType;
use crate::error::QueryError;
use crate::registry::{self, Comparison, FilterDescriptor};

pub const FIELDS_KEY: &str = "fields";
pub const SEARCH_KEY: &str = "q";
pub const PAGE_KEY: &str = "page";
pub const PER_PAGE_KEY: &str = "per_page";
pub const SORT_KEY: &str = "sort";
pub const LAT_KEY: &str = "lat";
pub const LON_KEY: &str = "lon";

const RESERVED_KEYS: &[&str] = &[FIELDS_KEY, SEARCH_KEY, PAGE_KEY, PER_PAGE_KEY, SORT_KEY];

/// Raw query parameters in request order. Keys may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Parse an `application/x-www-form-urlencoded` query string.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::InvalidParameter` if the string cannot be decoded.
    pub fn parse(query: Option<&str>) -> Result<Self, QueryError> {
        let Some(query) = query.filter(|q| !q.is_empty()) else {
            return Ok(Self::default());
        };
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)
            .map_err(|e| QueryError::invalid("query", format!("malformed query string: {e}")))?;
        Ok(Self { pairs })
    }

    /// Values of `key` in request order.
    pub fn all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Last value given for `key`.
    #[must_use]
    pub fn last(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Distinct keys in first-seen order.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for (k, _) in &self.pairs {
            if !keys.contains(&k.as_str()) {
                keys.push(k);
            }
        }
        keys
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// A validated value bound to a filter.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundValue {
    /// One or more identifiers/strings; any of them may match.
    Text(Vec<String>),
    /// A single calendar day.
    Day(NaiveDate),
    /// Inclusive span of days.
    Span { start: NaiveDate, end: NaiveDate },
    /// A WGS84 point.
    Point { lat: f64, lon: f64 },
    /// Free-text search terms.
    Search(String),
}

/// A filter descriptor paired with its validated value.
///
/// Only [`validate_filters`] builds bindings, so the value always has the
/// shape the filter's comparison expects.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub(crate) filter: &'static FilterDescriptor,
    pub(crate) value: BoundValue,
}

impl Binding {
    #[must_use]
    pub const fn filter(&self) -> &'static FilterDescriptor {
        self.filter
    }

    #[must_use]
    pub const fn value(&self) -> &BoundValue {
        &self.value
    }
}

/// Validate every non-reserved key of `params` against the registry.
///
/// Bindings are returned in the order their keys first appear; `q` (when
/// non-blank) is appended last and the `lat`/`lon` pair becomes a single
/// geo binding.
///
/// # Errors
///
/// Returns `QueryError::InvalidParameter` naming the first offending key.
pub fn validate_filters(
    entity: EntityType,
    params: &QueryParams,
) -> Result<Vec<Binding>, QueryError> {
    let mut bindings = Vec::new();
    let geo = registry::geo_filter(entity);

    for key in params.keys() {
        if RESERVED_KEYS.contains(&key) {
            continue;
        }

        if key == LAT_KEY || key == LON_KEY {
            if geo.is_none() {
                return Err(QueryError::invalid(
                    key,
                    format!("not a recognized filter for {entity}"),
                ));
            }
            continue;
        }

        let filter = registry::find_filter(entity, key)
            .filter(|f| f.comparison != Comparison::GeoRadius)
            .ok_or_else(|| {
                QueryError::invalid(key, format!("not a recognized filter for {entity}"))
            })?;

        let values: Vec<&str> = params.all(key).collect();
        bindings.push(Binding {
            filter,
            value: coerce(filter, &values)?,
        });
    }

    if let (Some(filter), Some(point)) = (geo, bind_point(params)?) {
        bindings.push(Binding {
            filter,
            value: point,
        });
    }

    if let Some(query) = params
        .last(SEARCH_KEY)
        .map(str::trim)
        .filter(|q| !q.is_empty())
    {
        bindings.push(Binding {
            filter: &registry::FULL_TEXT,
            value: BoundValue::Search(query.to_string()),
        });
    }

    Ok(bindings)
}

fn coerce(filter: &FilterDescriptor, values: &[&str]) -> Result<BoundValue, QueryError> {
    match filter.comparison {
        Comparison::Exact | Comparison::RelationalExists => Ok(BoundValue::Text(
            values.iter().map(|v| (*v).to_string()).collect(),
        )),
        Comparison::DateExact => {
            let raw = single(filter.key, values)?;
            parse_day(raw)
                .map(BoundValue::Day)
                .ok_or_else(|| QueryError::invalid(filter.key, format!("'{raw}' is not an ISO-8601 date")))
        }
        Comparison::DateRange => {
            let raw = single(filter.key, values)?;
            parse_span(raw).ok_or_else(|| {
                QueryError::invalid(
                    filter.key,
                    format!("'{raw}' is not an ISO-8601 date or 'start..end' range"),
                )
            })
        }
        // Bound from the lat/lon pair and the `q` key, never by their own key.
        Comparison::GeoRadius | Comparison::FullText => Err(QueryError::invalid(
            filter.key,
            "not a recognized filter",
        )),
    }
}

fn single<'a>(key: &str, values: &[&'a str]) -> Result<&'a str, QueryError> {
    match *values {
        [one] => Ok(one.trim()),
        _ => Err(QueryError::invalid(key, "may only be given once")),
    }
}

/// Parse `YYYY-MM-DD` or an RFC 3339 timestamp (keeping its date).
pub(crate) fn parse_day(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

fn parse_span(raw: &str) -> Option<BoundValue> {
    if let Some((start, end)) = raw.split_once("..") {
        let start = parse_day(start)?;
        let end = parse_day(end)?;
        return (start <= end).then_some(BoundValue::Span { start, end });
    }
    parse_day(raw).map(|day| BoundValue::Span {
        start: day,
        end: day,
    })
}

/// Merge `lat` and `lon` into one point; either one alone is ignored.
fn bind_point(params: &QueryParams) -> Result<Option<BoundValue>, QueryError> {
    let lats: Vec<&str> = params.all(LAT_KEY).collect();
    let lons: Vec<&str> = params.all(LON_KEY).collect();
    if lats.is_empty() || lons.is_empty() {
        return Ok(None);
    }

    let lat = parse_coordinate(LAT_KEY, single(LAT_KEY, &lats)?, 90.0)?;
    let lon = parse_coordinate(LON_KEY, single(LON_KEY, &lons)?, 180.0)?;
    Ok(Some(BoundValue::Point { lat, lon }))
}

fn parse_coordinate(key: &str, raw: &str, limit: f64) -> Result<f64, QueryError> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && v.abs() <= limit)
        .ok_or_else(|| QueryError::invalid(key, format!("'{raw}' is not a valid coordinate")))
}
