//! Builds parameterized SELECT, INSERT, UPDATE, DELETE for a validated entity.
//! Identifiers are checked against the allow-pattern and quoted into the text;
//! every value, including limits and ids, is a positional parameter.

use crate::config::{Catalog, Settings};
use crate::error::AppError;
use crate::sql::ident::{check_field, quoted, EntityName};
use crate::sql::params::PgBindValue;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Ordered column → value pairs from a request body.
pub type FieldMap = Map<String, Value>;

/// Command text plus its bound parameters, in placeholder order. `casts[i]` is the
/// catalog type of the column `params[i]` is bound to, when known.
#[derive(Clone, Debug, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
    pub casts: Vec<Option<String>>,
}

impl Statement {
    fn new() -> Self {
        Statement {
            sql: String::new(),
            params: Vec::new(),
            casts: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value, cast: Option<&str>) -> usize {
        self.params.push(v);
        self.casts.push(cast.map(String::from));
        self.params.len()
    }

    /// Parameters converted for binding, each guided by its column type.
    pub fn bind_values(&self) -> impl Iterator<Item = PgBindValue> + '_ {
        self.params
            .iter()
            .zip(&self.casts)
            .map(|(v, cast)| PgBindValue::for_column(v, cast.as_deref()))
    }

    /// Number of distinct `$n` placeholders in the command text.
    pub fn placeholder_count(&self) -> usize {
        let bytes = self.sql.as_bytes();
        let mut seen = std::collections::BTreeSet::new();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'$' {
                let start = i + 1;
                let mut end = start;
                while end < bytes.len() && bytes[end].is_ascii_digit() {
                    end += 1;
                }
                if end > start {
                    seen.insert(&self.sql[start..end]);
                }
                i = end.max(start);
            } else {
                i += 1;
            }
        }
        seen.len()
    }
}

#[derive(Clone, Debug)]
pub struct StatementBuilder {
    schema: String,
    created_at: String,
    updated_at: String,
    id_column: String,
    strict: bool,
    catalog: Arc<Catalog>,
}

impl StatementBuilder {
    pub fn new(settings: &Settings, catalog: Arc<Catalog>) -> Self {
        StatementBuilder {
            schema: settings.db_schema.clone(),
            created_at: settings.created_at_column.clone(),
            updated_at: settings.updated_at_column.clone(),
            id_column: settings.id_column.clone(),
            strict: settings.strict_catalog,
            catalog,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn table(&self, entity: &EntityName) -> Result<String, AppError> {
        if self.strict && self.catalog.entity(entity.as_str()).is_none() {
            return Err(AppError::UnknownEntity(entity.to_string()));
        }
        Ok(format!("{}.{}", quoted(&self.schema), quoted(entity.as_str())))
    }

    /// Validate a field key as a column of `entity`. In strict mode the column must
    /// be registered in the catalog; otherwise only the allow-pattern applies.
    fn column<'a>(&self, entity: &EntityName, name: &'a str) -> Result<&'a str, AppError> {
        let name = check_field(name)?;
        if self.strict && self.catalog.column_cast(entity.as_str(), name).is_none() {
            return Err(AppError::UnknownColumn {
                entity: entity.to_string(),
                column: name.to_string(),
            });
        }
        Ok(name)
    }

    /// Bind `value` for `column`: `$n`, or `$n::type` when the column is registered.
    fn bind(&self, q: &mut Statement, entity: &EntityName, column: &str, value: Value) -> String {
        let cast = self.catalog.column_cast(entity.as_str(), column);
        let n = q.push_param(value, cast);
        match cast {
            Some(cast) => format!("${}::{}", n, cast),
            None => format!("${}", n),
        }
    }

    /// Result columns. Registered columns whose type has no row decoder are read as
    /// text; everything else, and unregistered tables, use `*`.
    fn select_list(&self, entity: &EntityName) -> String {
        let Some(registered) = self.catalog.entity(entity.as_str()) else {
            return "*".to_string();
        };
        if registered.columns.iter().all(|c| decodes_natively(&c.cast)) {
            return "*".to_string();
        }
        registered
            .columns
            .iter()
            .map(|c| {
                let q = quoted(&c.name);
                if decodes_natively(&c.cast) {
                    q
                } else {
                    format!("{}::text AS {}", q, q)
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn order_by_created(&self) -> String {
        format!(" ORDER BY {} DESC", quoted(&self.created_at))
    }

    /// SELECT * ordered by creation timestamp, newest first; `LIMIT $1` when a limit is given.
    pub fn list(&self, entity: &EntityName, limit: Option<i64>) -> Result<Statement, AppError> {
        let mut q = Statement::new();
        let table = self.table(entity)?;
        let limit_clause = match limit {
            Some(n) => format!(" LIMIT ${}", q.push_param(Value::from(n), None)),
            None => String::new(),
        };
        q.sql = format!(
            "SELECT {} FROM {}{}{}",
            self.select_list(entity),
            table,
            self.order_by_created(),
            limit_clause
        );
        Ok(q)
    }

    /// SELECT * with a conjunctive equality filter in field order. Empty filter = unbounded list.
    pub fn filter(&self, entity: &EntityName, fields: &FieldMap) -> Result<Statement, AppError> {
        if fields.is_empty() {
            return self.list(entity, None);
        }
        let mut q = Statement::new();
        let table = self.table(entity)?;
        let mut where_parts = Vec::with_capacity(fields.len());
        for (key, val) in fields {
            let col = self.column(entity, key)?;
            let placeholder = self.bind(&mut q, entity, col, val.clone());
            where_parts.push(format!("{} = {}", quoted(col), placeholder));
        }
        q.sql = format!(
            "SELECT {} FROM {} WHERE {}{}",
            self.select_list(entity),
            table,
            where_parts.join(" AND "),
            self.order_by_created()
        );
        Ok(q)
    }

    /// INSERT columns in field order; returns the inserted row.
    pub fn insert(&self, entity: &EntityName, fields: &FieldMap) -> Result<Statement, AppError> {
        if fields.is_empty() {
            return Err(AppError::EmptyPayload);
        }
        let mut q = Statement::new();
        let table = self.table(entity)?;
        let mut cols = Vec::with_capacity(fields.len());
        let mut placeholders = Vec::with_capacity(fields.len());
        for (key, val) in fields {
            let col = self.column(entity, key)?;
            cols.push(quoted(col));
            placeholders.push(self.bind(&mut q, entity, col, val.clone()));
        }
        q.sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            table,
            cols.join(", "),
            placeholders.join(", "),
            self.select_list(entity)
        );
        Ok(q)
    }

    /// UPDATE by id: SET each field plus the server-assigned update timestamp.
    /// Body keys naming the id or update-timestamp column are not assigned.
    pub fn update(&self, entity: &EntityName, id: &Value, fields: &FieldMap) -> Result<Statement, AppError> {
        if fields.is_empty() {
            return Err(AppError::EmptyPayload);
        }
        let mut q = Statement::new();
        let table = self.table(entity)?;
        let mut sets = Vec::with_capacity(fields.len() + 1);
        for (key, val) in fields {
            let col = self.column(entity, key)?;
            if col == self.id_column || col == self.updated_at {
                continue;
            }
            let placeholder = self.bind(&mut q, entity, col, val.clone());
            sets.push(format!("{} = {}", quoted(col), placeholder));
        }
        sets.push(format!("{} = NOW()", quoted(&self.updated_at)));
        let id_placeholder = self.bind(&mut q, entity, &self.id_column, id.clone());
        q.sql = format!(
            "UPDATE {} SET {} WHERE {} = {} RETURNING {}",
            table,
            sets.join(", "),
            quoted(&self.id_column),
            id_placeholder,
            self.select_list(entity)
        );
        Ok(q)
    }

    /// DELETE by id.
    pub fn delete(&self, entity: &EntityName, id: &Value) -> Result<Statement, AppError> {
        let mut q = Statement::new();
        let table = self.table(entity)?;
        let id_placeholder = self.bind(&mut q, entity, &self.id_column, id.clone());
        q.sql = format!(
            "DELETE FROM {} WHERE {} = {}",
            table,
            quoted(&self.id_column),
            id_placeholder
        );
        Ok(q)
    }
}

/// Column types `row_to_json` decodes directly, as normalised by `ColumnDef::cast_type`.
fn decodes_natively(cast: &str) -> bool {
    matches!(
        cast,
        "smallint"
            | "int2"
            | "integer"
            | "int"
            | "int4"
            | "bigint"
            | "int8"
            | "real"
            | "float4"
            | "double precision"
            | "float8"
            | "boolean"
            | "bool"
            | "uuid"
            | "timestamptz"
            | "timestamp with time zone"
            | "timestamp"
            | "timestamp without time zone"
            | "date"
            | "json"
            | "jsonb"
            | "text"
            | "varchar"
            | "character varying"
            | "char"
            | "character"
            | "bpchar"
            | "name"
            | "text[]"
            | "varchar[]"
            | "character varying[]"
            | "integer[]"
            | "int4[]"
            | "bigint[]"
            | "int8[]"
    )
}
