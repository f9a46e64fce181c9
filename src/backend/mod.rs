//! Hosted backend adapters
//!
//! The blog only relies on a narrow slice of the hosted platform:
//! - `HostedBackend`: list, upsert-by-id and delete-by-id on the blog tables
//! - `ObjectStore`: put, list and public URLs for uploaded images
//!
//! `SupabaseBackend` implements both over the PostgREST and Storage REST
//! APIs. `create_backend` returns `None` when no credentials are configured,
//! which is a normal deployment rather than an error.

pub mod supabase;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::BackendConfig;
use crate::models::serde_helpers::lenient_id;
use crate::models::{Category, Post, Tag};

pub use supabase::SupabaseBackend;

/// Posts table
pub const POSTS_TABLE: &str = "blog_posts";
/// Categories table
pub const CATEGORIES_TABLE: &str = "blog_categories";
/// Tags table
pub const TAGS_TABLE: &str = "blog_tags";
/// Post/tag join table
pub const POST_TAGS_TABLE: &str = "blog_post_tags";

/// Error types for hosted backend calls
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// No URL / key configured
    #[error("Hosted backend is not configured")]
    NotConfigured,

    /// Transport failure (connect, timeout, TLS)
    #[error("Backend request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("Backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Response did not have the expected shape
    #[error("Failed to decode backend response: {0}")]
    Decode(String),
}

/// Row of the post/tag join table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostTagLink {
    #[serde(deserialize_with = "lenient_id::deserialize")]
    pub post_id: String,
    #[serde(deserialize_with = "lenient_id::deserialize")]
    pub tag_id: String,
}

impl PostTagLink {
    pub fn new(post_id: impl Into<String>, tag_id: impl Into<String>) -> Self {
        Self {
            post_id: post_id.into(),
            tag_id: tag_id.into(),
        }
    }
}

/// Hosted relational store holding the blog tables
#[async_trait]
pub trait HostedBackend: Send + Sync {
    /// All posts; `tags` is not populated, see `list_post_tags`
    async fn list_posts(&self) -> Result<Vec<Post>, BackendError>;

    async fn list_categories(&self) -> Result<Vec<Category>, BackendError>;

    async fn list_tags(&self) -> Result<Vec<Tag>, BackendError>;

    /// Every post/tag membership
    async fn list_post_tags(&self) -> Result<Vec<PostTagLink>, BackendError>;

    /// Insert or update by id, replace the post's tag memberships, and return
    /// the stored row
    async fn upsert_post(&self, post: &Post) -> Result<Post, BackendError>;

    /// Delete a post and its tag memberships
    async fn delete_post(&self, id: &str) -> Result<(), BackendError>;

    async fn upsert_category(&self, category: &Category) -> Result<Category, BackendError>;

    async fn delete_category(&self, id: &str) -> Result<(), BackendError>;

    async fn upsert_tag(&self, tag: &Tag) -> Result<Tag, BackendError>;

    async fn delete_tag(&self, id: &str) -> Result<(), BackendError>;
}

/// Object storage bucket for blog images
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` at `path` (never overwrites)
    async fn put_object(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), BackendError>;

    /// Object names directly under `folder`
    async fn list_objects(&self, folder: &str, limit: usize) -> Result<Vec<String>, BackendError>;

    /// Publicly reachable URL of the object at `path`
    fn public_url(&self, path: &str) -> String;
}

/// Build the hosted backend from configuration
///
/// Returns `Ok(None)` when the URL or key is missing.
pub fn create_backend(config: &BackendConfig, timeout: Duration) -> Result<Option<Arc<SupabaseBackend>>, BackendError> {
    if !config.is_configured() {
        return Ok(None);
    }
    let (Some(url), Some(key)) = (config.url.as_deref(), config.anon_key.as_deref()) else {
        return Err(BackendError::NotConfigured);
    };

    let backend = SupabaseBackend::new(url, key, &config.image_bucket, timeout)?;
    Ok(Some(Arc::new(backend)))
}
