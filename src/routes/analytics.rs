//! Analytics routes.

use crate::handlers::analytics::telemetry_overview;
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn analytics_routes(state: AppState) -> Router {
    Router::new()
        .route("/analytics/telemetry-overview", get(telemetry_overview))
        .with_state(state)
}
