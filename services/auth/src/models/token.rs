//! Refresh token model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Persisted refresh token entity
///
/// Revocation is a soft flag; rows are only removed by the periodic
/// cleanup job.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Token {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    pub is_revoked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New refresh token payload
#[derive(Debug, Clone)]
pub struct NewToken {
    pub user_id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}
