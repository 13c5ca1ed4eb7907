//! Custom error types for the authentication service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Custom error type for authentication operations
#[derive(Error, Debug)]
pub enum AuthError {
    /// Missing or malformed input
    #[error("{0}")]
    Validation(String),

    /// Unknown email, bad password, or invalid/expired/revoked token.
    /// The message is uniform so callers cannot tell the causes apart.
    #[error("Invalid email or password")]
    Unauthorized,

    /// Duplicate unique key, e.g. an already registered email
    #[error("{0}")]
    Conflict(String),

    /// Unexpected failure; details are logged, never surfaced
    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self {
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
            AuthError::Conflict(_) => StatusCode::CONFLICT,
            AuthError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Type alias for authentication results
pub type AuthResult<T> = Result<T, AuthError>;
