use std::env;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use common::database::{DatabaseConfig, health_check, init_pool};
use users::repositories::PgUserRepository;
use users::{AppState, routes};

/// Build the tracing filter: RUST_LOG wins; otherwise info-level, widened
/// to sqlx statement logging when SQL_ECHO=true
fn env_filter() -> EnvFilter {
    let sql_echo = env::var("SQL_ECHO")
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    let default_directives = if sql_echo { "info,sqlx=debug" } else { "info" };

    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt().with_env_filter(env_filter()).init();

    info!("Starting users service");

    // Initialize database connection pool (bounded retry, then abort)
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    // Initialize the repository and create the schema if needed
    let user_repository = PgUserRepository::new(pool);
    user_repository
        .ensure_schema()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create schema: {}", e))?;

    info!("Users service initialized successfully");

    let app_state = AppState::new(Arc::new(user_repository));

    // Start the web server
    let app = routes::create_router(app_state);

    let addr = env::var("HTTP_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Users service listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
