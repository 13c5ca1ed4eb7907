//! Integration tests for the infrastructure components
//!
//! These tests verify that the PostgreSQL database is properly configured
//! and accessible from the application. They are skipped when no
//! DATABASE_URL is exported.

use common::database::{DatabaseConfig, health_check, init_pool};
use sqlx::Row;

#[tokio::test]
async fn test_database_connectivity() -> Result<(), Box<dyn std::error::Error>> {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL not set, skipping database integration test");
        return Ok(());
    }

    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    assert!(health_check(&pool).await?, "Database health check failed");

    let row = sqlx::query("SELECT 1 as result").fetch_one(&pool).await?;

    let result: i32 = row.get("result");
    assert_eq!(result, 1, "PostgreSQL simple query test failed");

    Ok(())
}
