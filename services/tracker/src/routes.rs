//! Tracker service routes

use axum::{
    Extension, Json, Router,
    extract::{Multipart, State},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use serde_json::json;
use tracing::error;

use crate::{
    error::ApiError,
    middleware::{AuthUser, auth_middleware},
    state::AppState,
};

/// Create the router for the tracker service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/timer/start", post(start_timer))
        .route("/timer/pause", post(pause_timer))
        .route("/timer/resume", post(resume_timer))
        .route("/timer/end", post(end_timer))
        .route("/timer/update", post(update_timer))
        .route("/timer/today", get(today))
        .route("/screenshots/upload", post(upload_screenshot))
        .route("/screenshots", get(list_screenshots))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "tracker-service"
    }))
}

/// Start tracking, or return the already open segment
pub async fn start_timer(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let segment = state.engine.start(user.id, Utc::now()).await?;

    Ok(Json(json!({
        "message": "Timer started successfully",
        "segment": segment,
    })))
}

/// Pause the active segment
pub async fn pause_timer(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let segment = state.engine.pause(user.id, Utc::now()).await?;

    Ok(Json(json!({
        "message": "Timer paused successfully",
        "segment": segment,
    })))
}

/// Resume the paused segment
pub async fn resume_timer(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let segment = state.engine.resume(user.id, Utc::now()).await?;

    Ok(Json(json!({
        "message": "Timer resumed successfully",
        "segment": segment,
    })))
}

/// End the open segment and re-aggregate the daily record
pub async fn end_timer(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let segment = state.engine.end(user.id, Utc::now()).await?;

    Ok(Json(json!({
        "message": "Timer ended successfully",
        "segment": segment,
    })))
}

/// Heartbeat for the active segment
pub async fn update_timer(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let segment = state.engine.heartbeat(user.id, Utc::now()).await?;

    Ok(Json(json!({
        "message": "Timer updated successfully",
        "segment": segment,
    })))
}

/// The caller's daily record for today, with its segments
pub async fn today(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let (record, segments) = state
        .engine
        .daily_record(user.id, Utc::now().date_naive())
        .await?
        .ok_or_else(|| ApiError::NotFound("No daily record for today".to_string()))?;

    Ok(Json(json!({
        "record": record,
        "segments": segments,
    })))
}

/// Upload a screenshot and persist its metadata
pub async fn upload_screenshot(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut upload: Option<(String, Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::Validation("Malformed multipart body".to_string()))?
    {
        if field.name() != Some("screenshot") {
            continue;
        }

        let extension = field
            .file_name()
            .and_then(|name| std::path::Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default();
        let content_type = field.content_type().map(|ct| ct.to_string());
        let bytes = field
            .bytes()
            .await
            .map_err(|_| ApiError::Validation("Malformed multipart body".to_string()))?;

        upload = Some((extension, content_type, bytes.to_vec()));
    }

    let Some((extension, content_type, bytes)) = upload else {
        return Err(ApiError::Validation("No file uploaded".to_string()));
    };

    let captured_at = Utc::now();
    let object_key = format!("screenshots/{}{}", captured_at.timestamp_millis(), extension);

    state
        .storage
        .put(&object_key, bytes, content_type.as_deref())
        .await
        .map_err(|e| {
            error!("Failed to upload screenshot: {}", e);
            ApiError::Internal
        })?;

    let screenshot = state
        .screenshot_repository
        .create(user.id, captured_at, &object_key)
        .await
        .map_err(|e| {
            error!("Failed to persist screenshot metadata: {}", e);
            ApiError::Internal
        })?;

    Ok(Json(json!({
        "message": "File uploaded successfully",
        "fileUrl": state.storage.object_url(&object_key),
        "screenshot": screenshot,
    })))
}

/// List the caller's screenshots, newest first
pub async fn list_screenshots(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let screenshots = state
        .screenshot_repository
        .list_for_user(user.id)
        .await
        .map_err(|e| {
            error!("Failed to list screenshots: {}", e);
            ApiError::Internal
        })?;

    Ok(Json(json!({ "screenshots": screenshots })))
}
