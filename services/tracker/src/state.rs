//! Application state shared across handlers

use sqlx::PgPool;

use crate::engine::TimerEngine;
use crate::middleware::TokenVerifier;
use crate::repositories::ScreenshotRepository;
use crate::storage::ObjectStorage;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub engine: TimerEngine,
    pub screenshot_repository: ScreenshotRepository,
    pub storage: ObjectStorage,
    pub verifier: TokenVerifier,
}
