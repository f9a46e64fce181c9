//! Bulk import of a snapshot document
//!
//! Usage: import-snapshot <path-to-json>
//!
//! Pushes every category, tag and post in the document through the blog
//! service, against whatever backend `config.yml` configures.

use anyhow::{bail, Context, Result};
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bwblog::{config::Config, models::SnapshotDocument, services::BlogService};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bwblog=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let Some(path) = std::env::args().nth(1) else {
        bail!("Usage: import-snapshot <path-to-json>");
    };

    let text = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read {}", path))?;
    let document: SnapshotDocument =
        serde_json::from_str(&text).with_context(|| format!("{} is not a snapshot document", path))?;

    let config = Config::load_with_env(Path::new("config.yml"))?;
    if !config.backend.is_configured() {
        tracing::warn!("No hosted backend configured, importing into the local cache only");
    }

    let blog = BlogService::from_config(&config).await?;
    let stats = blog.import_dataset(document).await?;

    println!("Posts imported:     {}", stats.posts_imported);
    println!("Posts updated:      {}", stats.posts_updated);
    println!("Categories created: {}", stats.categories_created);
    println!("Tags created:       {}", stats.tags_created);
    if !stats.errors.is_empty() {
        println!("Errors:             {}", stats.errors.len());
        for failure in &stats.errors {
            println!("  {}: {}", failure.post, failure.error);
        }
    }

    Ok(())
}
