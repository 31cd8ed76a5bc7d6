//! Response helpers. Rows go out bare (objects and arrays), not wrapped in an envelope.

use axum::{http::StatusCode, Json};
use serde::Serialize;
use serde_json::Value;

#[derive(Serialize, Debug, PartialEq)]
pub struct DeleteBody {
    pub success: bool,
    pub message: String,
}

pub fn rows(data: Vec<Value>) -> (StatusCode, Json<Vec<Value>>) {
    (StatusCode::OK, Json(data))
}

pub fn created(row: Value) -> (StatusCode, Json<Value>) {
    (StatusCode::CREATED, Json(row))
}

pub fn ok(row: Value) -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(row))
}

pub fn deleted(entity: &str, id: &str) -> (StatusCode, Json<DeleteBody>) {
    (
        StatusCode::OK,
        Json(DeleteBody {
            success: true,
            message: format!("record {} of {} deleted", id, entity),
        }),
    )
}
