//! Postgres-backed [`ocd_query::CivicStore`].

mod postgres;
pub mod schema;

pub use postgres::{find_by_id_query, find_query, PgCivicStore};
