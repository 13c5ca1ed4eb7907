//! Custom error types for the tracker service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Custom error type for the tracker service
///
/// Variants carry the HTTP status they map to; unexpected failures are
/// surfaced as 500 without leaking internals.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or malformed input
    #[error("{0}")]
    Validation(String),

    /// Missing, invalid, or expired credential
    #[error("Unauthorized")]
    Unauthorized,

    /// Operation not valid for the current segment state
    #[error("{0}")]
    InvalidState(String),

    /// Duplicate unique key
    #[error("{0}")]
    Conflict(String),

    /// Referenced entity absent
    #[error("{0}")]
    NotFound(String),

    /// Database error
    #[error("Database error")]
    Database(#[from] sqlx::Error),

    /// Internal server error
    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) | ApiError::InvalidState(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Database(e) => {
                tracing::error!("Database failure: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Type alias for tracker results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::Validation("v".into()), StatusCode::BAD_REQUEST),
            (ApiError::Unauthorized, StatusCode::UNAUTHORIZED),
            (
                ApiError::InvalidState("no active segment".into()),
                StatusCode::BAD_REQUEST,
            ),
            (ApiError::Conflict("dup".into()), StatusCode::CONFLICT),
            (ApiError::NotFound("gone".into()), StatusCode::NOT_FOUND),
            (ApiError::Internal, StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn test_database_error_does_not_leak_details() {
        let error = ApiError::Database(sqlx::Error::PoolClosed);
        assert_eq!(error.to_string(), "Database error");
    }
}
