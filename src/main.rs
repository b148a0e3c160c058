//! Techzone site console

use anyhow::Result;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use techzone::{
    api::{self, AppState},
    backend::HttpBackend,
    config::Config,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "techzone=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Techzone console...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Content API client
    let backend = HttpBackend::shared(&config.backend)?;
    tracing::info!("Content API: {}", config.api_base_url());
    tracing::info!(
        "Blog list cache: {}s expiry, {} entries",
        config.cache.ttl_seconds,
        config.cache.max_capacity
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, backend);
    let app = api::build_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
