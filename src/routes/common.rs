//! Common routes: health, readiness, version, route listing.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

/// Every route the service mounts under `/api`, as reported by `GET /api/routes`.
pub const ROUTE_TABLE: &[(&str, &str)] = &[
    ("/api/health", "GET"),
    ("/api/ready", "GET"),
    ("/api/version", "GET"),
    ("/api/routes", "GET"),
    ("/api/analytics/telemetry-overview", "GET"),
    ("/api/:entity", "POST"),
    ("/api/:entity/create", "POST"),
    ("/api/:entity/list", "GET"),
    ("/api/:entity/filter", "POST"),
    ("/api/:entity/update/:id", "PUT"),
    ("/api/:entity/delete/:id", "DELETE"),
];

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
    message: &'static str,
}

#[derive(Serialize)]
struct ReadyBody {
    status: &'static str,
    database: &'static str,
}

#[derive(Serialize)]
struct RouteEntry {
    path: &'static str,
    methods: &'static str,
}

#[derive(Serialize)]
struct RoutesBody {
    total: usize,
    routes: Vec<RouteEntry>,
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody {
        status: "OK",
        message: "server operational",
    })
}

async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyBody>) {
    if let Err(e) = sqlx::query("SELECT 1").fetch_optional(state.crud.pool()).await {
        tracing::warn!(error = %e, "readiness check failed");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyBody {
                status: "degraded",
                database: "unavailable",
            }),
        );
    }
    (
        StatusCode::OK,
        Json(ReadyBody {
            status: "OK",
            database: "ok",
        }),
    )
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn routes() -> Json<RoutesBody> {
    let routes: Vec<RouteEntry> = ROUTE_TABLE
        .iter()
        .map(|&(path, methods)| RouteEntry { path, methods })
        .collect();
    Json(RoutesBody {
        total: routes.len(),
        routes,
    })
}

/// GET /health, /ready, /version, /routes.
pub fn common_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/version", get(version))
        .route("/routes", get(routes))
        .with_state(state)
}
