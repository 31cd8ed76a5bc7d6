//! Fixed telemetry aggregates.

use crate::error::AppError;
use crate::sql::ident::quoted;
use crate::sql::EntityName;
use serde::Serialize;
use sqlx::PgPool;

pub const TELEMETRY_TABLE: &str = "telemetry";

#[derive(Clone, Debug, Serialize, PartialEq, sqlx::FromRow)]
pub struct EventCount {
    pub event_type: Option<String>,
    pub total: i64,
}

#[derive(Clone, Debug, Serialize)]
pub struct TelemetryOverview {
    pub last_24h: Vec<EventCount>,
    pub by_event: Vec<EventCount>,
    pub total_events: i64,
    pub timestamp: String,
}

/// Event counts per type, overall and for the last 24 hours. Identifiers come from
/// validated settings; the table name is fixed.
pub async fn telemetry_overview(
    pool: &PgPool,
    schema: &str,
    created_at_column: &str,
) -> Result<TelemetryOverview, AppError> {
    let table = EntityName::parse(TELEMETRY_TABLE)?;
    let (recent_sql, all_sql) = overview_queries(schema, &table, created_at_column);

    tracing::debug!(sql = %recent_sql, "query");
    let last_24h: Vec<EventCount> = sqlx::query_as(&recent_sql).fetch_all(pool).await?;
    tracing::debug!(sql = %all_sql, "query");
    let by_event: Vec<EventCount> = sqlx::query_as(&all_sql).fetch_all(pool).await?;

    Ok(TelemetryOverview {
        total_events: by_event.iter().map(|e| e.total).sum(),
        last_24h,
        by_event,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

fn overview_queries(schema: &str, table: &EntityName, created_at_column: &str) -> (String, String) {
    let qualified = format!("{}.{}", quoted(schema), quoted(table.as_str()));
    let recent = format!(
        "SELECT event_type, COUNT(*) AS total FROM {} WHERE {} >= NOW() - INTERVAL '24 hours' GROUP BY event_type ORDER BY total DESC",
        qualified,
        quoted(created_at_column)
    );
    let all = format!(
        "SELECT event_type, COUNT(*) AS total FROM {} GROUP BY event_type ORDER BY total DESC",
        qualified
    );
    (recent, all)
}
