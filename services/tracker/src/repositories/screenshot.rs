//! Screenshot repository for database operations

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::Screenshot;

/// Screenshot repository
#[derive(Clone)]
pub struct ScreenshotRepository {
    pool: PgPool,
}

fn screenshot_from_row(row: &sqlx::postgres::PgRow) -> Screenshot {
    Screenshot {
        id: row.get("id"),
        user_id: row.get("user_id"),
        captured_at: row.get("captured_at"),
        object_key: row.get("object_key"),
        created_at: row.get("created_at"),
    }
}

impl ScreenshotRepository {
    /// Create a new screenshot repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist screenshot metadata
    pub async fn create(
        &self,
        user_id: Uuid,
        captured_at: DateTime<Utc>,
        object_key: &str,
    ) -> Result<Screenshot> {
        let row = sqlx::query(
            r#"
            INSERT INTO screenshots (user_id, captured_at, object_key)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, captured_at, object_key, created_at
            "#,
        )
        .bind(user_id)
        .bind(captured_at)
        .bind(object_key)
        .fetch_one(&self.pool)
        .await?;

        Ok(screenshot_from_row(&row))
    }

    /// List a user's screenshots, newest first
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Screenshot>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, captured_at, object_key, created_at
            FROM screenshots
            WHERE user_id = $1
            ORDER BY captured_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(screenshot_from_row).collect())
    }
}
