//! Process settings read from the environment (`.env` honoured via dotenvy).

use crate::error::ConfigError;
use crate::sql::is_identifier;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Schema qualifying every entity table.
    pub db_schema: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    /// Empty means any origin.
    pub cors_allowed_origins: Vec<String>,
    pub body_limit_bytes: usize,
    pub list_default_limit: i64,
    pub list_max_limit: i64,
    pub created_at_column: String,
    pub updated_at_column: String,
    pub id_column: String,
    pub strict_catalog: bool,
    pub bootstrap_tables: bool,
    pub tables_path: Option<PathBuf>,
    pub create_database: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database_url: "postgres://localhost/funnel".into(),
            host: "0.0.0.0".into(),
            port: 3000,
            db_schema: "public".into(),
            db_max_connections: 5,
            db_acquire_timeout: Duration::from_secs(30),
            cors_allowed_origins: vec!["http://localhost:5173".into()],
            body_limit_bytes: 1024 * 1024,
            list_default_limit: 100,
            list_max_limit: 1000,
            created_at_column: "created_at".into(),
            updated_at_column: "updated_at".into(),
            id_column: "id".into(),
            strict_catalog: false,
            bootstrap_tables: true,
            tables_path: None,
            create_database: false,
        }
    }
}

fn parsed<T: FromStr>(key: &'static str, raw: Option<String>, fallback: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(fallback),
        Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid { key, value: v }),
    }
}

fn flag(key: &'static str, raw: Option<String>, fallback: bool) -> Result<bool, ConfigError> {
    match raw.as_deref().map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(fallback),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid { key, value: v }),
        },
    }
}

fn identifier(key: &'static str, raw: Option<String>, fallback: String) -> Result<String, ConfigError> {
    let v = raw.map(|v| v.trim().to_string()).unwrap_or(fallback);
    if is_identifier(&v) {
        Ok(v)
    } else {
        Err(ConfigError::InvalidIdentifier { context: key, name: v })
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Settings::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let cors_allowed_origins = match get("CORS_ALLOWED_ORIGINS") {
            None => d.cors_allowed_origins,
            Some(v) if v.trim() == "*" => Vec::new(),
            Some(v) => v
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),
        };

        let settings = Settings {
            database_url: get("DATABASE_URL").unwrap_or(d.database_url),
            host: get("HOST").unwrap_or(d.host),
            port: parsed("PORT", get("PORT"), d.port)?,
            db_schema: identifier("DB_SCHEMA", get("DB_SCHEMA"), d.db_schema)?,
            db_max_connections: parsed("DB_MAX_CONNECTIONS", get("DB_MAX_CONNECTIONS"), d.db_max_connections)?,
            db_acquire_timeout: Duration::from_secs(parsed(
                "DB_ACQUIRE_TIMEOUT_SECS",
                get("DB_ACQUIRE_TIMEOUT_SECS"),
                d.db_acquire_timeout.as_secs(),
            )?),
            cors_allowed_origins,
            body_limit_bytes: parsed("BODY_LIMIT_BYTES", get("BODY_LIMIT_BYTES"), d.body_limit_bytes)?,
            list_default_limit: parsed("LIST_DEFAULT_LIMIT", get("LIST_DEFAULT_LIMIT"), d.list_default_limit)?,
            list_max_limit: parsed("LIST_MAX_LIMIT", get("LIST_MAX_LIMIT"), d.list_max_limit)?,
            created_at_column: identifier("CREATED_AT_COLUMN", get("CREATED_AT_COLUMN"), d.created_at_column)?,
            updated_at_column: identifier("UPDATED_AT_COLUMN", get("UPDATED_AT_COLUMN"), d.updated_at_column)?,
            id_column: identifier("ID_COLUMN", get("ID_COLUMN"), d.id_column)?,
            strict_catalog: flag("STRICT_CATALOG", get("STRICT_CATALOG"), d.strict_catalog)?,
            bootstrap_tables: flag("BOOTSTRAP_TABLES", get("BOOTSTRAP_TABLES"), d.bootstrap_tables)?,
            tables_path: get("TABLES_PATH").map(PathBuf::from),
            create_database: flag("CREATE_DATABASE", get("CREATE_DATABASE"), d.create_database)?,
        };

        if settings.list_default_limit < 1 {
            return Err(ConfigError::Invalid {
                key: "LIST_DEFAULT_LIMIT",
                value: settings.list_default_limit.to_string(),
            });
        }
        if settings.list_max_limit < settings.list_default_limit {
            return Err(ConfigError::Invalid {
                key: "LIST_MAX_LIMIT",
                value: settings.list_max_limit.to_string(),
            });
        }
        if settings.db_max_connections == 0 {
            return Err(ConfigError::Invalid {
                key: "DB_MAX_CONNECTIONS",
                value: "0".into(),
            });
        }
        Ok(settings)
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::Invalid {
                key: "HOST",
                value: self.host.clone(),
            })
    }
}
