use anyhow::Result;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

mod error;
mod models;
mod repositories;
mod resolver;
mod routes;
mod search;
mod state;

use common::cache::{DEFAULT_TTL, REFERENCE_TTL, TtlCache};
use common::database::{DatabaseConfig, init_pool};
use providers::{
    MetadataClient, MetadataConfig, RadioConfig, RadioDirectoryClient, VideoConfig,
    VideoPlatformClient,
};
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::{
    repositories::{ProfileRepository, content::ContentRepository},
    resolver::ContentResolver,
    search::SearchService,
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting API service");

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if common::database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    // Each provider client receives its explicitly constructed caches
    let metadata = Arc::new(MetadataClient::new(
        &MetadataConfig::from_env(),
        TtlCache::new(DEFAULT_TTL),
        TtlCache::new(REFERENCE_TTL),
    )?);
    let video = Arc::new(VideoPlatformClient::new(
        &VideoConfig::from_env(),
        TtlCache::new(DEFAULT_TTL),
    )?);
    let radio = Arc::new(RadioDirectoryClient::new(
        &RadioConfig::from_env(),
        TtlCache::new(DEFAULT_TTL),
        TtlCache::new(REFERENCE_TTL),
    )?);

    // Initialize repositories
    let content_repository = ContentRepository::new(pool.clone());
    let profile_repository = ProfileRepository::new(pool.clone());

    let resolver = ContentResolver::new(
        Arc::clone(&metadata),
        Arc::clone(&video),
        Arc::clone(&radio),
        content_repository.clone(),
        profile_repository.clone(),
    );
    let search = SearchService::new(Arc::clone(&metadata), Arc::clone(&radio));

    let app_state = AppState {
        db_pool: pool,
        content_repository,
        profile_repository,
        metadata,
        video,
        radio,
        resolver,
        search,
    };

    info!("API service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3001".to_string());
    let listener = TcpListener::bind(&bind_addr).await?;
    info!("API service listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
