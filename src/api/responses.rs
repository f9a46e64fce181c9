//! Shared API response types

use serde::Serialize;

use crate::models::{Category, Post, Tag};
use crate::services::format_date;

// ============================================================================
// Post Response Types
// ============================================================================

/// A post with its display date
#[derive(Debug, Serialize)]
pub struct PostResponse {
    #[serde(flatten)]
    pub post: Post,
    /// `5 March 2024` style date of publication (creation when unpublished)
    pub display_date: String,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        let display_date = format_date(Some(&post.sort_key()));
        Self { post, display_date }
    }
}

#[derive(Debug, Serialize)]
pub struct PostListResponse {
    pub posts: Vec<PostResponse>,
    pub total: usize,
}

impl From<Vec<Post>> for PostListResponse {
    fn from(posts: Vec<Post>) -> Self {
        Self {
            total: posts.len(),
            posts: posts.into_iter().map(Into::into).collect(),
        }
    }
}

// ============================================================================
// Taxonomy Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CategoryListResponse {
    pub categories: Vec<Category>,
}

#[derive(Debug, Serialize)]
pub struct TagListResponse {
    pub tags: Vec<Tag>,
}

// ============================================================================
// Admin Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ImageListResponse {
    pub images: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

/// Result of a cache reset and reload
#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    /// `hosted`, `snapshot`, `local` or `defaults`
    pub loaded_from: String,
    pub posts: usize,
}
