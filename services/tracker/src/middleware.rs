//! Bearer-token middleware for the tracker service

use axum::{
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

/// JWT claims structure, mirroring what the auth service signs
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// User email
    pub email: String,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
    /// Token kind (access or refresh)
    pub kind: TokenKind,
}

/// Token kind enum
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Authenticated user information
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}

/// Verifies bearer tokens against the shared HMAC secret
///
/// Built once at startup and handed to the router state; nothing is read
/// from the environment per request.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Create a verifier from a shared secret
    pub fn new(secret: &str) -> Self {
        let decoding_key = DecodingKey::from_secret(secret.as_bytes());
        let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
        validation.validate_exp = true;

        Self {
            decoding_key,
            validation,
        }
    }

    /// Create a verifier from the `JWT_SECRET` environment variable
    pub fn from_env() -> anyhow::Result<Self> {
        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable not set"))?;
        Ok(Self::new(&secret))
    }

    /// Verify a bearer token and require the access kind
    ///
    /// A refresh token is not a bearer credential here, even though it is
    /// signed with the same secret.
    pub fn verify_access(&self, token: &str) -> Option<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .ok()
            .filter(|claims| claims.kind == TokenKind::Access)
    }
}

/// Authentication middleware
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    // Extract the Authorization header
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    // Check if it's a Bearer token
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthorized)?;

    let claims = state
        .verifier
        .verify_access(token)
        .ok_or(ApiError::Unauthorized)?;

    let user = AuthUser {
        id: claims.sub,
        email: claims.email,
    };

    // Insert the user into the request extensions
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}
