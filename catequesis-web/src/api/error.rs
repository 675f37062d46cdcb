//! Mapping of record errors to HTTP responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use catequesis_common::Error;
use serde_json::json;
use tracing::error;

/// Error returned by every record handler
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self.0 {
            Error::Validation(fields) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({"error": "Validation failed", "fields": fields}),
            ),
            Error::NotFound(what) => (
                StatusCode::NOT_FOUND,
                json!({"error": format!("Not found: {}", what)}),
            ),
            Error::Duplicate(msg) | Error::Conflict(msg) => {
                (StatusCode::CONFLICT, json!({"error": msg}))
            }
            Error::InvalidInput(msg) => (StatusCode::BAD_REQUEST, json!({"error": msg})),
            other => {
                error!("Request failed: {}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({"error": "Internal server error"}),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
