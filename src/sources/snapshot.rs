//! Static snapshot source
//!
//! Reads the `{posts, categories, tags}` document published alongside the
//! site, either over HTTP or from a local path. Snapshot posts come from
//! migration tooling and may lack ids, slugs and derived fields; they are
//! completed here so every tier hands out the same `Post` shape.

use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;

use super::{DataSource, SourceError, SourceTier};
use crate::models::{Category, Dataset, Post, PostInput, SnapshotDocument, Tag};
use crate::services::identity::{calculate_reading_time, generate_slug};

/// Snapshot document at a URL or file path
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    location: String,
    client: reqwest::Client,
}

impl SnapshotSource {
    /// `location` is an `http(s)://` URL or a filesystem path
    pub fn new(location: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::Fetch(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            location: location.into(),
            client,
        })
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    fn is_remote(&self) -> bool {
        self.location.starts_with("http://") || self.location.starts_with("https://")
    }

    async fn read_text(&self) -> Result<String, SourceError> {
        if self.is_remote() {
            let response = self
                .client
                .get(&self.location)
                .send()
                .await
                .map_err(|e| SourceError::Fetch(e.to_string()))?;

            if !response.status().is_success() {
                return Err(SourceError::Fetch(format!(
                    "{} returned status {}",
                    self.location,
                    response.status()
                )));
            }

            response
                .text()
                .await
                .map_err(|e| SourceError::Fetch(e.to_string()))
        } else {
            tokio::fs::read_to_string(&self.location)
                .await
                .map_err(|e| SourceError::Fetch(format!("{}: {}", self.location, e)))
        }
    }

    /// Fetch and parse the raw document
    pub async fn fetch_document(&self) -> Result<SnapshotDocument, SourceError> {
        let text = self.read_text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Complete a snapshot record into a `Post`
///
/// Missing ids are derived deterministically (`wp-<legacy id>`, else
/// `snapshot-<slug>`) so reloads keep them stable. `category_slug` and
/// `tag_slugs` are resolved against the given taxonomy and take precedence
/// over ids carried by the record.
pub fn materialize_post(input: &PostInput, categories: &[Category], tags: &[Tag]) -> Post {
    let title = input.title.clone().unwrap_or_default();

    let slug = input
        .slug
        .clone()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| generate_slug(&title));
    let slug = if slug.is_empty() { "untitled".to_string() } else { slug };

    let id = match (&input.id, &input.legacy_id) {
        (Some(id), _) => id.clone(),
        (None, Some(legacy_id)) => format!("wp-{}", legacy_id),
        (None, None) => format!("snapshot-{}", slug),
    };

    let mut post = Post::new(id, slug, title);
    input.apply_to(&mut post);

    let created_at = input
        .created_at
        .or(input.published_at.flatten())
        .unwrap_or_else(Utc::now);
    post.created_at = created_at;
    post.updated_at = input.updated_at.unwrap_or(created_at);
    post.reading_time_minutes = calculate_reading_time(input.content.as_deref());

    if let Some(ref category_slug) = input.category_slug {
        post.category_id = categories
            .iter()
            .find(|c| &c.slug == category_slug)
            .map(|c| c.id.clone())
            .or_else(|| input.category_id.clone().flatten());
    }

    if let Some(ref tag_slugs) = input.tag_slugs {
        post.tags = tag_slugs
            .iter()
            .filter_map(|slug| tags.iter().find(|t| &t.slug == slug).map(|t| t.id.clone()))
            .collect();
    }

    post
}

#[async_trait]
impl DataSource for SnapshotSource {
    fn tier(&self) -> SourceTier {
        SourceTier::Snapshot
    }

    async fn load_all(&self) -> Result<Dataset, SourceError> {
        let document = self.fetch_document().await?;
        let posts = document
            .posts
            .iter()
            .map(|input| materialize_post(input, &document.categories, &document.tags))
            .collect();

        Ok(Dataset::new(posts, document.categories, document.tags))
    }
}
