//! Entity CRUD handlers: list, filter, create, update, delete.

use crate::error::AppError;
use crate::extractors::{EntityPath, FieldBody};
use crate::response;
use crate::service::parse_id;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use std::collections::HashMap;

fn parse_limit(params: &HashMap<String, String>) -> Result<Option<i64>, AppError> {
    match params.get("limit").map(|s| s.trim()) {
        None | Some("") => Ok(None),
        Some(raw) => match raw.parse::<i64>() {
            Ok(n) if n > 0 => Ok(Some(n)),
            _ => Err(AppError::BadRequest(format!("limit must be a positive integer, got '{}'", raw))),
        },
    }
}

/// GET /api/:entity/list?limit=N
pub async fn list(
    State(state): State<AppState>,
    path: EntityPath,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let limit = parse_limit(&params)?;
    let rows = state.crud.list(&path.entity, limit).await?;
    Ok(response::rows(rows))
}

/// POST /api/:entity/filter
pub async fn filter(
    State(state): State<AppState>,
    path: EntityPath,
    FieldBody(fields): FieldBody,
) -> Result<impl IntoResponse, AppError> {
    let rows = state.crud.filter(&path.entity, &fields).await?;
    Ok(response::rows(rows))
}

/// POST /api/:entity and POST /api/:entity/create
pub async fn create(
    State(state): State<AppState>,
    path: EntityPath,
    FieldBody(fields): FieldBody,
) -> Result<impl IntoResponse, AppError> {
    let row = state.crud.create(&path.entity, &fields).await?;
    tracing::info!(entity = %path.entity, "record created");
    Ok(response::created(row))
}

/// PUT /api/:entity/update/:id
pub async fn update(
    State(state): State<AppState>,
    path: EntityPath,
    FieldBody(fields): FieldBody,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(path.require_id()?);
    let row = state.crud.update(&path.entity, &id, &fields).await?;
    Ok(response::ok(row))
}

/// DELETE /api/:entity/delete/:id
pub async fn delete(
    State(state): State<AppState>,
    path: EntityPath,
) -> Result<impl IntoResponse, AppError> {
    let raw_id = path.require_id()?;
    let affected = state.crud.remove(&path.entity, &parse_id(raw_id)).await?;
    tracing::info!(entity = %path.entity, id = raw_id, affected, "record delete");
    Ok(response::deleted(path.entity.as_str(), raw_id))
}
