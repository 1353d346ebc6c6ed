//! Coinvault API Server
//!
//! Main entry point for the Coinvault wallet service.

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coinvault_api::{AppState, create_router};
use coinvault_db::migration::{Migrator, MigratorTrait};
use coinvault_db::{UserRepository, connect_with_pool};
use coinvault_shared::AppConfig;
use coinvault_shared::types::UserId;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coinvault=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Connect to database and bring the schema up to date
    let db = connect_with_pool(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await?;
    Migrator::up(&db, None).await?;
    info!("Connected to database");

    // The platform wallet belongs to a regular user account
    let owner = UserRepository::new(db.clone())
        .ensure(&config.platform.owner_username)
        .await?;

    let state = AppState::new(db, &config, Some(UserId::from_uuid(owner.id)))?;
    let platform = state.treasury.ensure_platform_wallet().await?;
    info!(
        address = %platform.address,
        fee_rate = %state.engine.fees().rate_percent(),
        "Platform wallet ready"
    );

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
