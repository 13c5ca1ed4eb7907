//! Schema registration for the Shiftlog database
//!
//! All tables and relationships are registered explicitly, once, at service
//! startup and before any request is served. The statements are idempotent
//! so every service can run them against the shared database.

use crate::error::{DatabaseError, DatabaseResult};
use sqlx::PgPool;
use tracing::info;

const SCHEMA_STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        is_admin BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tokens (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        user_id UUID NOT NULL REFERENCES users(id),
        token TEXT NOT NULL,
        token_type TEXT NOT NULL DEFAULT 'refresh',
        expires_at TIMESTAMPTZ NOT NULL,
        is_revoked BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_tokens_user_id ON tokens (user_id)
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_tokens_token ON tokens (token)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS daily_time_records (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        user_id UUID NOT NULL REFERENCES users(id),
        date DATE NOT NULL,
        total_seconds BIGINT NOT NULL DEFAULT 0,
        first_start_time TIME NOT NULL,
        last_end_time TIME,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        UNIQUE (user_id, date)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS time_segments (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        daily_record_id UUID NOT NULL REFERENCES daily_time_records(id),
        user_id UUID NOT NULL REFERENCES users(id),
        start_time TIMESTAMPTZ NOT NULL,
        end_time TIMESTAMPTZ,
        duration_seconds BIGINT,
        status TEXT NOT NULL DEFAULT 'active',
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    // At most one non-completed segment per user, enforced at the store.
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS idx_one_open_segment_per_user
        ON time_segments (user_id)
        WHERE status <> 'completed'
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_time_segments_record
        ON time_segments (daily_record_id, status)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS timer_events (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        user_id UUID NOT NULL REFERENCES users(id),
        event_type TEXT NOT NULL,
        timestamp TIMESTAMPTZ NOT NULL,
        elapsed_seconds BIGINT,
        segment_id UUID REFERENCES time_segments(id),
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_timer_events_segment ON timer_events (segment_id)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS screenshots (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        user_id UUID NOT NULL REFERENCES users(id),
        captured_at TIMESTAMPTZ NOT NULL,
        object_key TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_screenshots_user ON screenshots (user_id, captured_at)
    "#,
];

/// Register the full schema against the shared database
pub async fn register(pool: &PgPool) -> DatabaseResult<()> {
    info!("Registering database schema");

    for statement in SCHEMA_STATEMENTS {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(DatabaseError::Schema)?;
    }

    info!("Database schema registered");
    Ok(())
}
