//! One small jurisdiction worth of Open Civic Data records.

use ocd_query::MemoryStore;
use serde_json::{json, Value};

pub const JURISDICTION: &str = "ocd-jurisdiction/country:us/state:nc/government";
pub const STATE: &str = "ocd-division/country:us/state:nc";
pub const DISTRICT: &str = "ocd-division/country:us/state:nc/sldl:1";
pub const HOUSE: &str = "ocd-organization/5b9b6f0a-5a6e-4bf6-9f86-0f0e0b5f3a01";
pub const SENATE: &str = "ocd-organization/5b9b6f0a-5a6e-4bf6-9f86-0f0e0b5f3a02";
pub const ALICE: &str = "ocd-person/8f8aacb2-0ff7-41b9-9c69-91db22cfa811";
pub const BOB: &str = "ocd-person/8f8aacb2-0ff7-41b9-9c69-91db22cfa812";
pub const CAROL: &str = "ocd-person/8f8aacb2-0ff7-41b9-9c69-91db22cfa813";
pub const HEARING: &str = "ocd-event/0d8f2a6e-7a41-4d49-a9c3-000000000001";
pub const SESSION_DAY: &str = "ocd-event/0d8f2a6e-7a41-4d49-a9c3-000000000002";
pub const PASSAGE: &str = "ocd-vote/6c4e1b7d-2c5f-4e0a-8d1b-000000000001";
pub const BILL_COUNT: usize = 12;

/// A point inside [`district_shape`] (downtown Raleigh).
pub const RALEIGH: (&str, &str) = ("35.78", "-78.64");
/// A point well outside the state.
pub const DENVER: (&str, &str) = ("39.74", "-104.99");

pub fn bill_id(n: usize) -> String {
    format!("ocd-bill/3a1c2b7e-9d0f-4b8e-a7c6-{n:012}")
}

fn district_shape() -> Value {
    json!({
        "type": "Polygon",
        "coordinates": [[
            [-79.0, 35.5], [-78.3, 35.5], [-78.3, 36.0], [-79.0, 36.0], [-79.0, 35.5]
        ]],
    })
}

fn state_shape() -> Value {
    json!({
        "type": "Polygon",
        "coordinates": [[
            [-84.3, 33.8], [-75.4, 33.8], [-75.4, 36.6], [-84.3, 36.6], [-84.3, 33.8]
        ]],
    })
}

fn district_post() -> Value {
    json!({
        "label": "1",
        "role": "Representative",
        "division": {
            "id": DISTRICT,
            "geometries": [{"boundary": {"shape": district_shape()}}],
        },
    })
}

fn bills() -> Vec<Value> {
    (1..=BILL_COUNT)
        .map(|n| {
            let (title, subject) = if n % 3 == 0 {
                ("An act to fund rural broadband", json!(["technology"]))
            } else {
                ("An act concerning hog farming", json!(["agriculture"]))
            };
            let sponsor = if n % 2 == 0 { ALICE } else { BOB };
            let session = if n <= 8 { "2015" } else { "2013" };
            json!({
                "id": bill_id(n),
                "identifier": format!("HB {n}"),
                "title": title,
                "classification": ["bill"],
                "subject": subject,
                "from_organization_id": HOUSE,
                "from_organization": {"id": HOUSE, "name": "North Carolina House"},
                "legislative_session": {
                    "identifier": session,
                    "jurisdiction_id": JURISDICTION,
                },
                "sponsorships": [{
                    "name": "Primary sponsor",
                    "primary": true,
                    "person": {"id": sponsor},
                    "organization": null,
                }],
                "actions": [],
                "created_at": format!("2015-01-{n:02}T12:00:00+00:00"),
                "updated_at": format!("2015-02-{n:02}T12:00:00+00:00"),
            })
        })
        .collect()
}

fn people() -> Vec<Value> {
    vec![
        json!({
            "id": ALICE,
            "name": "Alice Adams",
            "sort_name": "Adams, Alice",
            "image": "",
            "gender": "female",
            "birth_date": "1970-03-14",
            "memberships": [
                {"organization": {"id": HOUSE}, "post": district_post(), "end_date": ""},
            ],
        }),
        json!({
            "id": BOB,
            "name": "Bob Baker",
            "sort_name": "Baker, Bob",
            "image": "",
            "gender": "male",
            "birth_date": "1962-07-01",
            "memberships": [
                {"organization": {"id": SENATE}, "end_date": "2009-01-01"},
                {"organization": {"id": HOUSE}, "end_date": ""},
            ],
        }),
        json!({
            "id": CAROL,
            "name": "Carol Chen",
            "sort_name": "Chen, Carol",
            "image": "",
            "gender": "female",
            "memberships": [],
        }),
    ]
}

fn organizations() -> Vec<Value> {
    vec![
        json!({
            "id": HOUSE,
            "name": "North Carolina House",
            "image": "",
            "classification": "lower",
            "jurisdiction_id": JURISDICTION,
            "parent_id": null,
            "founding_date": "1776-12-18",
        }),
        json!({
            "id": SENATE,
            "name": "North Carolina Senate",
            "image": "",
            "classification": "upper",
            "jurisdiction_id": JURISDICTION,
            "parent_id": null,
        }),
    ]
}

fn events() -> Vec<Value> {
    vec![
        json!({
            "id": HEARING,
            "name": "Agriculture Committee hearing",
            "description": "Hog farming nuisance rules",
            "classification": "committee-meeting",
            "start_time": "2015-03-04T09:00:00-05:00",
            "timezone": "America/New_York",
            "all_day": false,
            "status": "passed",
            "jurisdiction_id": JURISDICTION,
            "participants": [{"entity_id": ALICE, "entity_type": "person"}],
            "agenda": [{
                "description": "HB 2",
                "related_entities": [{"bill_id": bill_id(2)}],
            }],
        }),
        json!({
            "id": SESSION_DAY,
            "name": "House floor session",
            "description": "",
            "classification": "session",
            "start_time": "2015-04-20T10:00:00-04:00",
            "timezone": "America/New_York",
            "all_day": false,
            "status": "passed",
            "jurisdiction_id": JURISDICTION,
            "participants": [{"entity_id": HOUSE, "entity_type": "organization"}],
            "agenda": [],
        }),
    ]
}

fn votes() -> Vec<Value> {
    vec![json!({
        "id": PASSAGE,
        "identifier": "HB 2 third reading",
        "motion_text": "Passage on third reading",
        "start_date": "2015-04-20",
        "result": "pass",
        "bill_id": bill_id(2),
        "organization_id": HOUSE,
        "legislative_session": {"identifier": "2015"},
        "votes": [
            {"option": "yes", "voter_id": ALICE},
            {"option": "no", "voter_id": BOB},
        ],
    })]
}

fn jurisdictions() -> Vec<Value> {
    vec![json!({
        "id": JURISDICTION,
        "name": "North Carolina",
        "url": "https://www.ncleg.gov",
        "classification": "government",
        "division_id": STATE,
    })]
}

fn divisions() -> Vec<Value> {
    vec![
        json!({
            "id": STATE,
            "name": "North Carolina",
            "country": "us",
            "jurisdictions": [JURISDICTION],
            "children": [DISTRICT],
            "geometries": [{
                "boundary": {
                    "set": {"name": "States", "start_date": "2010-01-01", "end_date": ""},
                    "shape": state_shape(),
                },
            }],
        }),
        json!({
            "id": DISTRICT,
            "name": "North Carolina House District 1",
            "country": "us",
            "jurisdictions": [],
            "children": [],
            "geometries": [{
                "boundary": {
                    "set": {"name": "NC House 2012", "start_date": "2012-01-01", "end_date": "2021-12-31"},
                    "shape": district_shape(),
                },
            }],
        }),
    ]
}

/// A store loaded with every collection above.
pub fn store() -> MemoryStore {
    let store = MemoryStore::new();
    store
        .load(json!({
            "bills": bills(),
            "people": people(),
            "organizations": organizations(),
            "events": events(),
            "votes": votes(),
            "jurisdictions": jurisdictions(),
            "divisions": divisions(),
        }))
        .expect("fixtures load");
    store
}
