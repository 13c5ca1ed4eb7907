//! User repository for database operations

use anyhow::Result;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::models::{NewUser, User};

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

fn user_from_row(row: &sqlx::postgres::PgRow) -> User {
    User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        is_admin: row.get("is_admin"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Hash a plaintext password with argon2
    pub fn hash_password(password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut rand::thread_rng());
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
            .to_string();
        Ok(hash)
    }

    /// Verify a plaintext password against a stored hash
    pub fn verify_password(hash: &str, password: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(hash) else {
            return false;
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    /// Create a new user
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        info!("Creating new user: {}", new_user.email);

        let password_hash = Self::hash_password(&new_user.password)?;

        let row = sqlx::query(
            r#"
            INSERT INTO users (name, email, password_hash, is_admin)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, password_hash, is_admin, created_at, updated_at
            "#,
        )
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&password_hash)
        .bind(new_user.is_admin)
        .fetch_one(&self.pool)
        .await?;

        Ok(user_from_row(&row))
    }

    /// Find a user by email, including the password hash
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, email, password_hash, is_admin, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, email, password_hash, is_admin, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }
}
