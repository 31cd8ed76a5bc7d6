//! Connection pool construction and database creation.

use crate::config::Settings;
use crate::error::{AppError, ConfigError};
use crate::sql::ident::quoted;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::ConnectOptions;
use sqlx::PgPool;
use std::str::FromStr;

/// Pool sized and timed from settings. Connections are acquired per query.
pub async fn connect_pool(settings: &Settings) -> Result<PgPool, AppError> {
    let pool = pool_options(settings).connect(&settings.database_url).await?;
    Ok(pool)
}

/// Pool that connects on first use; for tests and for starting before the database is up.
pub fn connect_pool_lazy(settings: &Settings) -> Result<PgPool, AppError> {
    let pool = pool_options(settings).connect_lazy(&settings.database_url)?;
    Ok(pool)
}

fn pool_options(settings: &Settings) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(settings.db_max_connections)
        .acquire_timeout(settings.db_acquire_timeout)
}

/// Ensure the database in `database_url` exists; create it if not. Connects to the
/// default `postgres` database to run CREATE DATABASE. Call before creating the main pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = PgConnectOptions::from_str(&admin_url).map_err(|e| invalid_url(e.to_string()))?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quoted(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

/// Split a URL into (admin URL pointing at `postgres`, database name). Query
/// parameters such as `sslmode` are kept on the admin URL.
fn parse_db_name_from_url(url: &str) -> Result<(String, String), ConfigError> {
    let (without_query, query) = match url.split_once('?') {
        Some((u, q)) => (u, Some(q)),
        None => (url, None),
    };
    let scheme_end = without_query.find("://").map(|i| i + 3).unwrap_or(0);
    let path_start = without_query[scheme_end..]
        .find('/')
        .map(|i| scheme_end + i + 1)
        .ok_or_else(|| invalid_url(format!("no database path in {}", redact(url))))?;
    let db_name = without_query[path_start..].trim().to_string();
    let mut admin_url = format!("{}postgres", &without_query[..path_start]);
    if let Some(q) = query {
        admin_url.push('?');
        admin_url.push_str(q);
    }
    Ok((admin_url, db_name))
}

fn invalid_url(value: String) -> ConfigError {
    ConfigError::Invalid {
        key: "DATABASE_URL",
        value,
    }
}

/// URL with any password replaced, for error messages.
fn redact(url: &str) -> String {
    let Some(scheme_end) = url.find("://").map(|i| i + 3) else {
        return url.to_string();
    };
    let rest = &url[scheme_end..];
    let authority_end = rest.find('/').unwrap_or(rest.len());
    match rest[..authority_end].rfind('@') {
        Some(at) => match rest[..at].find(':') {
            Some(colon) => format!("{}{}:***{}", &url[..scheme_end], &rest[..colon], &rest[at..]),
            None => url.to_string(),
        },
        None => url.to_string(),
    }
}
