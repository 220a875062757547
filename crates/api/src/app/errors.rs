use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use catalog_core::ValidationError;
use catalog_infra::RepositoryError;

/// Everything a handler can fail with, mapped onto one JSON error shape.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("invalid request body: {0}")]
    InvalidBody(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(e) => json_error(StatusCode::BAD_REQUEST, e.code(), e.to_string()),
            ApiError::Repository(e) => repository_error_to_response(e),
            ApiError::InvalidBody(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_body", msg),
        }
    }
}

pub fn repository_error_to_response(err: RepositoryError) -> Response {
    let status = match &err {
        RepositoryError::AlreadyExists(_) => StatusCode::CONFLICT,
        RepositoryError::NotFound(_) => StatusCode::NOT_FOUND,
        RepositoryError::Storage(_) => {
            error!(error = %err, "repository failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    json_error(status, err.code(), err.to_string())
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
