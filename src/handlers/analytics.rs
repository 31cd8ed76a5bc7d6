//! Analytics handlers: fixed aggregate reads.

use crate::error::AppError;
use crate::service::telemetry_overview as overview;
use crate::state::AppState;
use axum::{extract::State, Json};

/// GET /api/analytics/telemetry-overview
pub async fn telemetry_overview(
    State(state): State<AppState>,
) -> Result<Json<crate::service::TelemetryOverview>, AppError> {
    let settings = &state.settings;
    let out = overview(state.crud.pool(), &settings.db_schema, &settings.created_at_column).await?;
    Ok(Json(out))
}
