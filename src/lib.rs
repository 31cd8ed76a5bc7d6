//! Funnel API: generic entity CRUD and telemetry analytics over PostgreSQL.

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod migration;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use config::{load_catalog, resolve, Catalog, Settings, TableDef};
pub use error::{AppError, ConfigError};
pub use migration::bootstrap_tables;
pub use routes::app;
pub use service::CrudService;
pub use sql::{EntityName, FieldMap, Statement, StatementBuilder};
pub use state::AppState;
pub use store::{connect_pool, connect_pool_lazy, ensure_database_exists};

use std::sync::Arc;

/// Wire settings, catalog and pool into the shared state.
pub fn build_state(settings: Settings, catalog: Catalog, pool: sqlx::PgPool) -> AppState {
    let builder = StatementBuilder::new(&settings, Arc::new(catalog));
    let crud = CrudService::new(pool, builder, settings.list_default_limit, settings.list_max_limit);
    AppState::new(crud, settings)
}
