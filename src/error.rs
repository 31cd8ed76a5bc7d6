//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
    #[error("invalid identifier in {context}: '{name}'")]
    InvalidIdentifier { context: &'static str, name: String },
    #[error("duplicate {kind}: {name}")]
    Duplicate { kind: &'static str, name: String },
    #[error("missing reference: table '{table}' referenced by {from}")]
    MissingReference { table: String, from: String },
    #[error("table load: {0}")]
    Load(String),
    #[error("validation: {0}")]
    Validation(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid entity name: {0}")]
    InvalidEntity(String),
    #[error("invalid field name: {0}")]
    InvalidField(String),
    #[error("no fields provided")]
    EmptyPayload,
    #[error("unknown entity: {0}")]
    UnknownEntity(String),
    #[error("unknown column '{column}' for entity {entity}")]
    UnknownColumn { entity: String, column: String },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("request body too large")]
    PayloadTooLarge,
    #[error("{0}")]
    Query(#[from] sqlx::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidEntity(_)
            | AppError::InvalidField(_)
            | AppError::EmptyPayload
            | AppError::UnknownColumn { .. }
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::UnknownEntity(_) | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Query(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message sent to the client. Configuration errors stay in the logs; driver
    /// errors are passed through verbatim.
    fn public_message(&self) -> String {
        match self {
            AppError::Config(_) => "internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        ErrorBody {
            error: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        (status, Json(ErrorBody::new(self.public_message()))).into_response()
    }
}
