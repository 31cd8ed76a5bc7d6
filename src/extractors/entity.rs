//! Extract and validate the `{entity}` (and optional `{id}`) path parameters.

use crate::error::AppError;
use crate::sql::EntityName;
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use std::collections::HashMap;

/// Entity from the path with hyphens mapped to underscores, validated against the
/// identifier allow-pattern before any handler runs.
#[derive(Clone, Debug)]
pub struct EntityPath {
    pub entity: EntityName,
    pub id: Option<String>,
}

impl EntityPath {
    pub fn require_id(&self) -> Result<&str, AppError> {
        self.id
            .as_deref()
            .ok_or_else(|| AppError::BadRequest("missing id".into()))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for EntityPath
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        let raw = params
            .get("entity")
            .ok_or_else(|| AppError::BadRequest("missing entity".into()))?;
        let entity = EntityName::from_path_segment(raw)?;
        Ok(EntityPath {
            entity,
            id: params.get("id").cloned(),
        })
    }
}
