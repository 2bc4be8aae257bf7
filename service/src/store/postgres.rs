//! `PostgreSQL` implementation of [`CivicStore`].
//!
//! Each request becomes one statement. The row document is assembled with
//! `json_build_object`, so the store hands back records already keyed by
//! output field name.

use async_trait::async_trait;
use ocd_query::{
    CivicStore, EntityType, FieldTest, Predicate, Record, StoreError, StoreQuery,
};
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::schema::{self, Column};

const ROOT: &str = "t";
const SEARCH_CONFIG: &str = "simple";

/// `PostgreSQL`-backed store over the opencivicdata schema.
pub struct PgCivicStore {
    pool: PgPool,
}

impl PgCivicStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CivicStore for PgCivicStore {
    async fn find(&self, query: &StoreQuery) -> Result<Vec<Record>, StoreError> {
        let mut qb = find_query(query)?;
        let docs: Vec<Value> = qb
            .build_query_scalar()
            .fetch_all(&self.pool)
            .await
            .map_err(unavailable)?;
        docs.into_iter().map(into_record).collect()
    }

    async fn find_by_id(
        &self,
        entity: EntityType,
        id: &str,
        columns: &[&'static str],
    ) -> Result<Option<Record>, StoreError> {
        let mut qb = find_by_id_query(entity, id, columns);
        let doc: Option<Value> = qb
            .build_query_scalar()
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?;
        doc.map(into_record).transpose()
    }
}

fn unavailable(err: sqlx::Error) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

fn into_record(doc: Value) -> Result<Record, StoreError> {
    match doc {
        Value::Object(record) => Ok(record),
        other => Err(StoreError::Malformed(format!(
            "expected a JSON object row, got {other}"
        ))),
    }
}

/// Build the statement for a list query.
///
/// # Errors
///
/// Returns `StoreError::Malformed` if the predicate follows a relation the
/// schema does not declare.
pub fn find_query(query: &StoreQuery) -> Result<QueryBuilder<'static, Postgres>, StoreError> {
    let mut qb = QueryBuilder::new("");
    push_document(&mut qb, query.entity, &query.columns);

    qb.push(" WHERE ");
    let mut aliases = 0;
    push_predicate(&mut qb, &query.predicate, query.entity, &mut aliases)?;

    let order = match schema::column(query.entity, query.order.field) {
        Some(Column::Own(name)) => name,
        _ => "id",
    };
    let direction = if query.order.descending { "DESC" } else { "ASC" };
    qb.push(format!(
        " ORDER BY {ROOT}.{order} {direction} NULLS LAST, {ROOT}.id ASC LIMIT "
    ));
    qb.push_bind(i64::from(query.limit));
    qb.push(" OFFSET ");
    qb.push_bind(i64::try_from(query.offset).unwrap_or(i64::MAX));

    Ok(qb)
}

/// Build the statement for a detail lookup.
#[must_use]
pub fn find_by_id_query(
    entity: EntityType,
    id: &str,
    columns: &[&'static str],
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("");
    push_document(&mut qb, entity, columns);
    qb.push(format!(" WHERE {ROOT}.id = "));
    qb.push_bind(id.to_string());
    qb
}

fn push_document(qb: &mut QueryBuilder<'static, Postgres>, entity: EntityType, columns: &[&str]) {
    qb.push("SELECT json_build_object(");
    let mut first = true;
    for name in columns {
        let Some(column) = schema::column(entity, name) else {
            tracing::warn!(entity = %entity, field = name, "field has no column mapping");
            continue;
        };
        if !first {
            qb.push(", ");
        }
        first = false;
        qb.push(format!("'{name}', {}", column.render(ROOT)));
    }
    qb.push(format!(") AS doc FROM {} {ROOT}", schema::table_for(entity)));
}

fn push_predicate(
    qb: &mut QueryBuilder<'static, Postgres>,
    predicate: &Predicate,
    entity: EntityType,
    aliases: &mut usize,
) -> Result<(), StoreError> {
    match predicate {
        Predicate::All { predicates } if predicates.is_empty() => {
            qb.push("TRUE");
        }
        Predicate::All { predicates } => {
            qb.push("(");
            for (i, child) in predicates.iter().enumerate() {
                if i > 0 {
                    qb.push(" AND ");
                }
                push_predicate(qb, child, entity, aliases)?;
            }
            qb.push(")");
        }
        Predicate::Field { relations, test } => {
            let mut table = schema::table_for(entity);
            let mut alias = ROOT.to_string();
            for hop in relations {
                let relation = schema::relation(table, hop).ok_or_else(|| {
                    StoreError::Malformed(format!("no relation '{hop}' from {table}"))
                })?;
                *aliases += 1;
                let child = format!("a{aliases}");
                qb.push(format!(
                    "EXISTS (SELECT 1 FROM {} {child} WHERE {} AND ",
                    relation.to,
                    relation.render(&alias, &child)
                ));
                table = relation.to;
                alias = child;
            }
            push_test(qb, test, table, &alias);
            for _ in relations {
                qb.push(")");
            }
        }
        Predicate::Search {
            fields,
            query,
            min_rank,
        } => {
            let columns: Vec<String> = fields.iter().map(|f| format!("{ROOT}.{f}")).collect();
            let document = format!(
                "to_tsvector('{SEARCH_CONFIG}', concat_ws(' ', {}))",
                columns.join(", ")
            );
            qb.push(format!(
                "({document} @@ plainto_tsquery('{SEARCH_CONFIG}', "
            ));
            qb.push_bind(query.clone());
            qb.push(format!(
                ") AND ts_rank({document}, plainto_tsquery('{SEARCH_CONFIG}', "
            ));
            qb.push_bind(query.clone());
            qb.push(")) > ");
            qb.push_bind(*min_rank);
            qb.push(")");
        }
    }
    Ok(())
}

fn push_test(qb: &mut QueryBuilder<'static, Postgres>, test: &FieldTest, table: &str, alias: &str) {
    match test {
        FieldTest::Equals { field, values } => {
            let expr = schema::terminal(table, field, alias);
            if schema::is_array(table, field) {
                qb.push(format!("{expr} && "));
                qb.push_bind(values.clone());
            } else {
                qb.push(format!("{expr}::text = ANY("));
                qb.push_bind(values.clone());
                qb.push(")");
            }
        }
        FieldTest::OnDate { field, day } => {
            let expr = schema::terminal(table, field, alias);
            qb.push(format!("left({expr}::text, 10) = "));
            qb.push_bind(day.to_string());
        }
        FieldTest::Within {
            field,
            until: None,
            start,
            end,
        } => {
            let expr = schema::terminal(table, field, alias);
            qb.push(format!("left({expr}::text, 10) BETWEEN "));
            qb.push_bind(start.to_string());
            qb.push(" AND ");
            qb.push_bind(end.to_string());
        }
        FieldTest::Within {
            field,
            until: Some(until),
            start,
            end,
        } => {
            let opens = schema::terminal(table, field, alias);
            let closes = schema::terminal(table, until, alias);
            qb.push(format!("({opens} IS NULL OR left({opens}::text, 10) <= "));
            qb.push_bind(end.to_string());
            qb.push(format!(
                ") AND ({closes} IS NULL OR {closes}::text = '' OR left({closes}::text, 10) >= "
            ));
            qb.push_bind(start.to_string());
            qb.push(")");
        }
        FieldTest::Near {
            field,
            lat,
            lon,
            radius_meters,
        } => {
            let expr = schema::terminal(table, field, alias);
            qb.push(format!(
                "ST_DWithin({expr}::geography, ST_SetSRID(ST_MakePoint("
            ));
            qb.push_bind(*lon);
            qb.push(", ");
            qb.push_bind(*lat);
            qb.push("), 4326)::geography, ");
            qb.push_bind(*radius_meters);
            qb.push(")");
        }
    }
}
