use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

use auth::AppState;
use auth::jwt::{JwtConfig, JwtService};
use auth::repositories::{TokenRepository, UserRepository};
use auth::routes;
use auth::service::AuthService;
use auth::tokens::TokenService;
use common::{database, schema};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting authentication service");

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

    // Wire up the services with explicit handles
    let jwt_service = JwtService::new(JwtConfig::from_env()?);
    let user_repository = UserRepository::new(pool.clone());
    let token_repository = TokenRepository::new(pool.clone());
    let token_service = TokenService::new(token_repository, jwt_service);
    let auth_service = AuthService::new(user_repository, token_service.clone())?;

    // Schedule the periodic token cleanup job
    let cleanup_schedule =
        std::env::var("TOKEN_CLEANUP_SCHEDULE").unwrap_or_else(|_| "0 0 * * * *".to_string());
    start_token_cleanup(token_service, &cleanup_schedule).await?;

    let app_state = AppState { auth_service };

    // Start the web server
    let app = routes::create_router(app_state);

    let addr = std::env::var("AUTH_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Authentication service listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Start the scheduler that deletes expired and revoked tokens
///
/// The job is fire-and-forget: a failed run is logged and retried on the
/// next tick with no other side effects.
async fn start_token_cleanup(token_service: TokenService, schedule: &str) -> Result<()> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async(schedule, move |_, _| {
        let token_service = token_service.clone();
        Box::pin(async move {
            match token_service.cleanup_expired().await {
                Ok(deleted) => info!("Token cleanup removed {} rows", deleted),
                Err(e) => error!("Token cleanup failed: {}", e),
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;

    info!("Started token cleanup scheduler with schedule: {}", schedule);
    Ok(())
}
