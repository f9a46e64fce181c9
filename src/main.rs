//! bwblog - blog data service for the Black and White Accounting site

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bwblog::{
    api::{self, AppState},
    config::Config,
    services::{BlogService, LoadOutcome},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bwblog=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting bwblog...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!(
        "Configuration loaded (storage: {:?}, snapshot: {})",
        config.storage.driver,
        if config.snapshot.is_enabled() { config.snapshot.source.as_str() } else { "disabled" }
    );

    let blog = Arc::new(BlogService::from_config(&config).await?);

    // Warm the cache so the first request does not pay for the load
    let warm = blog.clone();
    tokio::spawn(async move {
        match warm.ensure_loaded().await {
            LoadOutcome::Source(tier) => tracing::info!("Blog cache warmed from {} source", tier),
            LoadOutcome::Defaults => tracing::info!("Blog cache warmed with default taxonomy"),
        }
    });

    if config.server.admin_token.is_none() {
        tracing::warn!("No admin token configured, admin routes are open");
    }
    let state = AppState::new(blog, config.server.admin_token.clone());
    let app = api::build_router(state, &config.server);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
