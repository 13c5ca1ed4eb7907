//! Authentication service routes

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{AppState, error::AuthError, models::{LoginCredentials, NewUser}};

/// Response for token generation
#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Request for token refresh and logout
#[derive(Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Response for token refresh
#[derive(Serialize)]
pub struct RefreshTokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Create the router for the authentication service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh_token))
        .route("/auth/logout", post(logout))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "auth-service"
    }))
}

/// User registration endpoint
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<NewUser>,
) -> Result<impl IntoResponse, AuthError> {
    info!("Registration attempt for email: {}", payload.email);

    let user = state.auth_service.register(payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "User registered successfully",
            "user": user,
        })),
    ))
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginCredentials>,
) -> Result<impl IntoResponse, AuthError> {
    info!("Login attempt for email: {}", payload.email);

    let (user, tokens) = state
        .auth_service
        .login(&payload.email, &payload.password)
        .await?;

    let response = TokenResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: tokens.expires_in,
    };

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "user": user,
            "tokens": response,
        })),
    ))
}

/// Refresh token endpoint
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(payload): Json<RefreshTokenRequest>,
) -> Result<impl IntoResponse, AuthError> {
    info!("Token refresh request");

    let access_token = state
        .auth_service
        .refresh_access_token(&payload.refresh_token)
        .await?;

    let response = RefreshTokenResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.auth_service.tokens().access_token_expiry(),
    };

    Ok((StatusCode::OK, Json(response)))
}

/// Logout endpoint; revoking an already revoked token still succeeds
pub async fn logout(
    State(state): State<AppState>,
    Json(payload): Json<RefreshTokenRequest>,
) -> Result<impl IntoResponse, AuthError> {
    info!("Logout request");

    state.auth_service.logout(&payload.refresh_token).await?;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({"message": "Logged out successfully"})),
    ))
}
