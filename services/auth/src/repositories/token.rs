//! Refresh token repository for database operations

use anyhow::Result;
use chrono::Utc;
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::models::{NewToken, Token};

/// Refresh token repository
#[derive(Clone)]
pub struct TokenRepository {
    pool: PgPool,
}

fn token_from_row(row: &sqlx::postgres::PgRow) -> Token {
    Token {
        id: row.get("id"),
        user_id: row.get("user_id"),
        token: row.get("token"),
        token_type: row.get("token_type"),
        expires_at: row.get("expires_at"),
        is_revoked: row.get("is_revoked"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

impl TokenRepository {
    /// Create a new token repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist a refresh token with is_revoked = false
    pub async fn save(&self, new_token: &NewToken) -> Result<Token> {
        let row = sqlx::query(
            r#"
            INSERT INTO tokens (user_id, token, token_type, expires_at, is_revoked)
            VALUES ($1, $2, 'refresh', $3, FALSE)
            RETURNING id, user_id, token, token_type, expires_at, is_revoked,
                      created_at, updated_at
            "#,
        )
        .bind(new_token.user_id)
        .bind(&new_token.token)
        .bind(new_token.expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(token_from_row(&row))
    }

    /// Find an unrevoked, unexpired refresh token by its token string
    pub async fn find_active(&self, token: &str) -> Result<Option<Token>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, token, token_type, expires_at, is_revoked,
                   created_at, updated_at
            FROM tokens
            WHERE token = $1 AND is_revoked = FALSE AND expires_at > $2
            "#,
        )
        .bind(token)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(token_from_row))
    }

    /// Revoke all tokens for a user; returns the number of rows updated
    ///
    /// Revocation is a soft flag. Re-revoking already revoked rows is a
    /// no-op, so the operation is idempotent.
    pub async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE tokens
            SET is_revoked = TRUE, updated_at = now()
            WHERE user_id = $1 AND is_revoked = FALSE
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Revoke a specific token by its token string
    pub async fn revoke(&self, token: &str) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE tokens
            SET is_revoked = TRUE, updated_at = now()
            WHERE token = $1 AND is_revoked = FALSE
            "#,
        )
        .bind(token)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Delete tokens that are expired or revoked
    pub async fn delete_expired_or_revoked(&self) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM tokens
            WHERE expires_at < $1 OR is_revoked = TRUE
            "#,
        )
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let deleted = result.rows_affected();
        info!("Deleted {} expired or revoked tokens", deleted);
        Ok(deleted)
    }
}
