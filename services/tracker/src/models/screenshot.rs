//! Screenshot model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Screenshot entity
///
/// Only the object key and capture timestamp are persisted; the bytes
/// live in object storage.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Screenshot {
    pub id: Uuid,
    pub user_id: Uuid,
    pub captured_at: DateTime<Utc>,
    pub object_key: String,
    pub created_at: DateTime<Utc>,
}
