//! Load table definitions from a JSON file or the built-in set, and build the catalog.

use crate::config::{default_tables, resolve, Catalog, Settings, TableDef};
use crate::error::ConfigError;
use std::path::Path;

/// Read a JSON array of table definitions.
pub async fn load_tables_from_path(path: &Path) -> Result<Vec<TableDef>, ConfigError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    parse_tables(&raw).map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))
}

pub fn parse_tables(raw: &str) -> Result<Vec<TableDef>, serde_json::Error> {
    serde_json::from_str(raw)
}

/// Tables from `settings.tables_path` when set, else the built-in set; resolved into a catalog.
pub async fn load_catalog(settings: &Settings) -> Result<Catalog, ConfigError> {
    let tables = match &settings.tables_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading table definitions");
            load_tables_from_path(path).await?
        }
        None => default_tables(),
    };
    resolve(
        &tables,
        &[settings.created_at_column.as_str(), settings.updated_at_column.as_str()],
    )
}
