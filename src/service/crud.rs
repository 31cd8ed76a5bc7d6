//! Generic CRUD execution against PostgreSQL.

use crate::error::AppError;
use crate::sql::{EntityName, FieldMap, Statement, StatementBuilder};
use serde_json::Value;
use sqlx::postgres::types::PgInterval;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres};

/// Data-access handle: owns the pool and the statement builder. Cheap to clone.
#[derive(Clone, Debug)]
pub struct CrudService {
    pool: PgPool,
    builder: StatementBuilder,
    default_limit: i64,
    max_limit: i64,
}

impl CrudService {
    pub fn new(pool: PgPool, builder: StatementBuilder, default_limit: i64, max_limit: i64) -> Self {
        CrudService {
            pool,
            builder,
            default_limit,
            max_limit,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn builder(&self) -> &StatementBuilder {
        &self.builder
    }

    /// Newest rows first, bounded by `limit` (default 100, clamped to the configured maximum).
    pub async fn list(&self, entity: &EntityName, limit: Option<i64>) -> Result<Vec<Value>, AppError> {
        let limit = limit.unwrap_or(self.default_limit).clamp(1, self.max_limit);
        let q = self.builder.list(entity, Some(limit))?;
        self.fetch_all(entity, "list", &q).await
    }

    /// Equality filter on every field; empty filter returns all rows.
    pub async fn filter(&self, entity: &EntityName, fields: &FieldMap) -> Result<Vec<Value>, AppError> {
        let q = self.builder.filter(entity, fields)?;
        self.fetch_all(entity, "filter", &q).await
    }

    /// Insert one row. Returns the created row.
    pub async fn create(&self, entity: &EntityName, fields: &FieldMap) -> Result<Value, AppError> {
        let q = self.builder.insert(entity, fields)?;
        self.fetch_optional(entity, "create", &q)
            .await?
            .ok_or(AppError::Query(sqlx::Error::RowNotFound))
    }

    /// Update one row by id. Zero matching rows is `NotFound`.
    pub async fn update(&self, entity: &EntityName, id: &Value, fields: &FieldMap) -> Result<Value, AppError> {
        let q = self.builder.update(entity, id, fields)?;
        self.fetch_optional(entity, "update", &q)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} {}", entity, display_id(id))))
    }

    /// Delete by id. Succeeds whether or not a row existed; returns rows affected.
    pub async fn remove(&self, entity: &EntityName, id: &Value) -> Result<u64, AppError> {
        let q = self.builder.delete(entity, id)?;
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let result = bind_all(&q)
            .execute(&self.pool)
            .await
            .map_err(|e| query_failed(entity, "remove", e))?;
        Ok(result.rows_affected())
    }

    async fn fetch_all(&self, entity: &EntityName, op: &'static str, q: &Statement) -> Result<Vec<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let rows = bind_all(q)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| query_failed(entity, op, e))?;
        rows.iter()
            .map(row_to_json)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| query_failed(entity, op, e))
    }

    async fn fetch_optional(
        &self,
        entity: &EntityName,
        op: &'static str,
        q: &Statement,
    ) -> Result<Option<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let row = bind_all(q)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| query_failed(entity, op, e))?;
        row.as_ref()
            .map(row_to_json)
            .transpose()
            .map_err(|e| query_failed(entity, op, e))
    }
}

/// Unnamed (non-cached) statement: parameter types vary with the body for the same
/// SQL text, and a cached statement would keep the types of its first execution.
fn bind_all(q: &Statement) -> Query<'_, Postgres, PgArguments> {
    let mut query = sqlx::query(&q.sql).persistent(false);
    for value in q.bind_values() {
        query = query.bind(value);
    }
    query
}

fn query_failed(entity: &EntityName, op: &'static str, e: sqlx::Error) -> AppError {
    tracing::error!(entity = %entity, op, error = %e, "query failed");
    AppError::Query(e)
}

fn display_id(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Path ids: integers when they parse as such, text otherwise.
pub fn parse_id(raw: &str) -> Value {
    match raw.parse::<i64>() {
        Ok(n) => Value::Number(n.into()),
        Err(_) => Value::String(raw.to_string()),
    }
}

/// One result row as a JSON object in column order. A column that cannot be decoded
/// is an error rather than a silent null.
pub fn row_to_json(row: &PgRow) -> Result<Value, sqlx::Error> {
    use sqlx::Column;
    use sqlx::Row;
    let mut map = serde_json::Map::new();
    for (i, col) in row.columns().iter().enumerate() {
        map.insert(col.name().to_string(), cell_to_value(row, i)?);
    }
    Ok(Value::Object(map))
}

fn cell_to_value(row: &PgRow, i: usize) -> Result<Value, sqlx::Error> {
    use sqlx::postgres::types::{Oid, PgInterval, PgMoney};
    use sqlx::postgres::PgTypeKind;
    use sqlx::types::Decimal;
    use sqlx::{Column, Row, TypeInfo};
    let type_info = row.columns()[i].type_info();
    let type_name = type_info.name().to_ascii_uppercase();
    let decoded: Option<Value> = match type_name.as_str() {
        "INT2" => row.try_get::<Option<i16>, _>(i)?.map(Value::from),
        "INT4" => row.try_get::<Option<i32>, _>(i)?.map(Value::from),
        "INT8" => row.try_get::<Option<i64>, _>(i)?.map(Value::from),
        "FLOAT4" => row
            .try_get::<Option<f32>, _>(i)?
            .map(|n| serde_json::Number::from_f64(n as f64).map_or(Value::Null, Value::Number)),
        "FLOAT8" => row
            .try_get::<Option<f64>, _>(i)?
            .map(|n| serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number)),
        "NUMERIC" => row
            .try_get::<Option<Decimal>, _>(i)?
            .map(|d| Value::String(d.to_string())),
        "MONEY" => row
            .try_get::<Option<PgMoney>, _>(i)?
            .map(|m| Value::String(m.to_decimal(2).to_string())),
        "BOOL" => row.try_get::<Option<bool>, _>(i)?.map(Value::Bool),
        "UUID" => row
            .try_get::<Option<uuid::Uuid>, _>(i)?
            .map(|u| Value::String(u.to_string())),
        "OID" => row.try_get::<Option<Oid>, _>(i)?.map(|o| Value::from(o.0)),
        "TIMESTAMPTZ" => row
            .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(i)?
            .map(|d| Value::String(d.to_rfc3339())),
        "TIMESTAMP" => row
            .try_get::<Option<chrono::NaiveDateTime>, _>(i)?
            .map(|d| Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string())),
        "DATE" => row
            .try_get::<Option<chrono::NaiveDate>, _>(i)?
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string())),
        "TIME" => row
            .try_get::<Option<chrono::NaiveTime>, _>(i)?
            .map(|t| Value::String(t.format("%H:%M:%S%.f").to_string())),
        "INTERVAL" => row
            .try_get::<Option<PgInterval>, _>(i)?
            .map(|iv| Value::String(interval_to_iso8601(&iv))),
        "BYTEA" => row
            .try_get::<Option<Vec<u8>>, _>(i)?
            .map(|b| Value::String(bytea_to_hex(&b))),
        "JSON" | "JSONB" => row.try_get::<Option<Value>, _>(i)?,
        "TEXT[]" | "VARCHAR[]" | "BPCHAR[]" | "NAME[]" => row
            .try_get::<Option<Vec<String>>, _>(i)?
            .map(|items| Value::Array(items.into_iter().map(Value::String).collect())),
        "INT4[]" => row
            .try_get::<Option<Vec<i32>>, _>(i)?
            .map(|items| Value::Array(items.into_iter().map(Value::from).collect())),
        "INT8[]" => row
            .try_get::<Option<Vec<i64>>, _>(i)?
            .map(|items| Value::Array(items.into_iter().map(Value::from).collect())),
        // Enum values travel as their label text.
        _ if matches!(type_info.kind(), PgTypeKind::Enum(_)) => row
            .try_get_unchecked::<Option<String>, _>(i)?
            .map(Value::String),
        _ => row.try_get::<Option<String>, _>(i)?.map(Value::String),
    };
    Ok(decoded.unwrap_or(Value::Null))
}

/// ISO 8601 duration, e.g. `P1M2DT3.5S`.
fn interval_to_iso8601(iv: &PgInterval) -> String {
    let mut out = format!("P{}M{}D", iv.months, iv.days);
    if iv.microseconds != 0 {
        let sign = if iv.microseconds < 0 { "-" } else { "" };
        let micros = iv.microseconds.unsigned_abs();
        let (secs, frac) = (micros / 1_000_000, micros % 1_000_000);
        if frac == 0 {
            out.push_str(&format!("T{}{}S", sign, secs));
        } else {
            let frac = format!("{:06}", frac);
            out.push_str(&format!("T{}{}.{}S", sign, secs, frac.trim_end_matches('0')));
        }
    }
    out
}

/// PostgreSQL's hex output form for bytea: `\x` followed by two digits per byte.
fn bytea_to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("\\x");
    for b in bytes {
        out.push_str(&format!("{:02x}", b));
    }
    out
}
