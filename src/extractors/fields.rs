//! Extract a request body as an ordered FieldMap.

use crate::error::AppError;
use crate::sql::FieldMap;
use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::StatusCode,
};
use serde_json::Value;

/// Flat JSON object body. An empty body is an empty map, so `POST /filter` without
/// a body behaves as an unfiltered listing.
#[derive(Clone, Debug, Default)]
pub struct FieldBody(pub FieldMap);

impl FieldBody {
    pub fn parse(bytes: &[u8]) -> Result<Self, AppError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(FieldBody::default());
        }
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| AppError::BadRequest(format!("invalid JSON body: {}", e)))?;
        match value {
            Value::Object(m) => Ok(FieldBody(m)),
            _ => Err(AppError::BadRequest("body must be a JSON object".into())),
        }
    }
}

#[async_trait]
impl<S> FromRequest<S> for FieldBody
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|e| {
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                AppError::PayloadTooLarge
            } else {
                AppError::BadRequest(e.body_text())
            }
        })?;
        FieldBody::parse(&bytes)
    }
}
