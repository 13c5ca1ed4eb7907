use anyhow::Result;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use common::{database, schema};
use tracker::engine::TimerEngine;
use tracker::middleware::TokenVerifier;
use tracker::repositories::ScreenshotRepository;
use tracker::routes;
use tracker::state::AppState;
use tracker::storage::ObjectStorage;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting tracker service");

    // Initialize database connection pool
    let db_config = database::DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;

    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    // Register the schema before serving any request
    schema::register(&pool).await?;

    let verifier = TokenVerifier::from_env()?;

    let storage = ObjectStorage::from_env().await?;
    storage.ensure_bucket().await?;

    let app_state = AppState {
        db_pool: pool.clone(),
        engine: TimerEngine::new(pool.clone()),
        screenshot_repository: ScreenshotRepository::new(pool),
        storage,
        verifier,
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let addr = std::env::var("TRACKER_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3001".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Tracker service listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
