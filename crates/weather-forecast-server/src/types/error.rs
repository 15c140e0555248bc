//! Error types and their HTTP status mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use super::request::ValidationIssue;

/// Message returned with 503 when no model is loaded.
pub const MODEL_NOT_LOADED: &str =
    "Model not loaded. Please ensure model artifacts are available.";

/// Message returned with 400 for an unparseable target date.
pub const INVALID_DATE: &str = "Invalid date format. Use YYYY-MM-DD format.";

/// All errors that can occur in the server.
#[derive(thiserror::Error, Debug)]
pub enum ServerError {
    #[error("Request validation failed ({} issue(s))", .0.len())]
    Validation(Vec<ValidationIssue>),

    #[error("{}", MODEL_NOT_LOADED)]
    ModelNotLoaded,

    #[error("{}", INVALID_DATE)]
    InvalidDate,

    #[error("Prediction error: {0}")]
    Prediction(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::ModelNotLoaded => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::InvalidDate => StatusCode::BAD_REQUEST,
            ServerError::Prediction(_) | ServerError::Transport(_) | ServerError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// JSON error body: `{"detail": ...}`.
    pub fn to_body(&self) -> serde_json::Value {
        match self {
            ServerError::Validation(issues) => json!({ "detail": issues }),
            other => json!({ "detail": other.to_string() }),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!("{self}");
        } else {
            tracing::debug!("Rejected request: {self}");
        }
        (status, Json(self.to_body())).into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;
