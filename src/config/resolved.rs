//! Resolved catalog: table definitions validated and flattened for runtime lookups.

use crate::config::{validate, ColumnDef, TableDef};
use crate::error::ConfigError;
use std::collections::HashMap;

#[derive(Clone, Debug)]
pub struct ColumnInfo {
    pub name: String,
    /// Placeholder cast, e.g. `timestamptz` in `$3::timestamptz`.
    pub cast: String,
}

#[derive(Clone, Debug)]
pub struct CatalogEntity {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
    pub pk_column: String,
    /// Full definitions including the implicit timestamp columns; used for DDL.
    pub definition: TableDef,
}

impl CatalogEntity {
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Entity name → known columns, registered once at startup.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    entities: Vec<CatalogEntity>,
    by_name: HashMap<String, usize>,
}

impl Catalog {
    pub fn entity(&self, name: &str) -> Option<&CatalogEntity> {
        self.by_name.get(name).map(|&i| &self.entities[i])
    }

    /// Entities in definition (creation) order.
    pub fn entities(&self) -> &[CatalogEntity] {
        &self.entities
    }

    /// Cast for `entity.column`, when both are registered.
    pub fn column_cast(&self, entity: &str, column: &str) -> Option<&str> {
        self.entity(entity)
            .and_then(|e| e.column(column))
            .map(|c| c.cast.as_str())
    }
}

/// Build the catalog from table definitions (validates first). Timestamp columns
/// the builder relies on are appended when a table does not declare them.
pub fn resolve(tables: &[TableDef], timestamp_columns: &[&str]) -> Result<Catalog, ConfigError> {
    validate(tables)?;
    let mut entities = Vec::with_capacity(tables.len());
    let mut by_name = HashMap::new();

    for t in tables {
        let mut definition = t.clone();
        for name in timestamp_columns {
            if !definition.columns.iter().any(|c| c.name == *name) {
                definition.columns.push(ColumnDef {
                    nullable: false,
                    default: Some("NOW()".into()),
                    ..ColumnDef::new(name, "TIMESTAMPTZ")
                });
            }
        }
        let pk_column = definition
            .columns
            .iter()
            .find(|c| c.primary_key)
            .map(|c| c.name.clone())
            .ok_or_else(|| ConfigError::Validation(format!("table {} has no primary key", t.name)))?;
        let columns = definition
            .columns
            .iter()
            .map(|c| ColumnInfo {
                name: c.name.clone(),
                cast: c.cast_type(),
            })
            .collect();
        by_name.insert(t.name.clone(), entities.len());
        entities.push(CatalogEntity {
            name: t.name.clone(),
            columns,
            pk_column,
            definition,
        });
    }

    Ok(Catalog { entities, by_name })
}
