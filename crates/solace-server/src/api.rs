//! API error mapping for the Solace server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use solace_turn::{TurnError, ValidationRejection};
use thiserror::Error;

/// API error type mapping to HTTP status codes.
///
/// Turn failures keep their stable reason codes; transport-level failures
/// get generic codes of their own.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
    #[error(transparent)]
    Turn(#[from] TurnError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", msg.clone())
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::InternalServerError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                msg.clone(),
            ),
            ApiError::Turn(e) => {
                let status = if e.is_client_error() {
                    StatusCode::BAD_REQUEST
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                };
                (status, e.reason_code(), e.to_string())
            }
        };

        let mut body = serde_json::json!({
            "error": message,
            "code": code,
        });

        // Attach the measured offending value where one exists.
        if let ApiError::Turn(TurnError::Rejected(rejection)) = &self {
            match rejection {
                ValidationRejection::TooLarge { size_mb, .. } => {
                    body["file_size_mb"] = serde_json::json!(size_mb);
                }
                ValidationRejection::TooLong { duration_secs, .. } => {
                    body["duration"] = serde_json::json!(duration_secs);
                }
                ValidationRejection::BadExtension { .. } => {}
            }
        }

        (status, Json(body)).into_response()
    }
}
