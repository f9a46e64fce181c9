//! Post model
//!
//! This module provides:
//! - `Post` entity representing a blog post as held in the cache
//! - `PostStatus` enum for publication states
//! - `PostInput`, the partial record accepted by saves, snapshots and imports
//! - `SearchFilters` for post searches

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::serde_helpers::{lenient_id, nullable, timestamp};

/// Reading time used when a post has no content
pub const DEFAULT_READING_TIME_MINUTES: u32 = 5;

fn default_reading_time() -> u32 {
    DEFAULT_READING_TIME_MINUTES
}

/// Post entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    /// Stable identifier, never reassigned
    #[serde(deserialize_with = "lenient_id::deserialize")]
    pub id: String,
    /// Identifier from the system the post was migrated from
    #[serde(
        default,
        alias = "legacy_wp_id",
        deserialize_with = "lenient_id::option::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub legacy_id: Option<String>,
    /// Original URL in the system the post was migrated from
    #[serde(default, alias = "legacy_wp_url", skip_serializing_if = "Option::is_none")]
    pub legacy_url: Option<String>,
    /// URL-friendly slug, unique among posts
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    /// Rich text (HTML) content
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub status: PostStatus,
    #[serde(default, with = "timestamp::option")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default = "Utc::now", with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now", with = "timestamp")]
    pub updated_at: DateTime<Utc>,
    /// Weak reference to a category id
    #[serde(default, deserialize_with = "lenient_id::option::deserialize")]
    pub category_id: Option<String>,
    /// Weak references to tag ids
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub featured_image_url: Option<String>,
    #[serde(default)]
    pub featured_image_alt: Option<String>,
    #[serde(default)]
    pub meta_title: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    /// Derived from content, see `calculate_reading_time`
    #[serde(default = "default_reading_time")]
    pub reading_time_minutes: u32,
}

impl Post {
    /// Create a draft post with the given identity and title
    pub fn new(id: String, slug: String, title: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            legacy_id: None,
            legacy_url: None,
            slug,
            title,
            excerpt: String::new(),
            content: String::new(),
            status: PostStatus::Draft,
            published_at: None,
            created_at: now,
            updated_at: now,
            category_id: None,
            tags: Vec::new(),
            featured_image_url: None,
            featured_image_alt: None,
            meta_title: None,
            meta_description: None,
            author_name: None,
            reading_time_minutes: DEFAULT_READING_TIME_MINUTES,
        }
    }

    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }

    /// Timestamp listings are ordered by: `published_at`, else `created_at`
    pub fn sort_key(&self) -> DateTime<Utc> {
        self.published_at.unwrap_or(self.created_at)
    }

    /// Case-insensitive substring match over title, excerpt and content.
    ///
    /// `needle` must already be lowercased.
    pub fn matches_query(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.excerpt.to_lowercase().contains(needle)
            || self.content.to_lowercase().contains(needle)
    }
}

/// Post publication status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    /// Draft - not visible to readers
    #[default]
    Draft,
    /// Scheduled - will be published at `published_at`
    Scheduled,
    /// Published - visible to readers
    #[serde(alias = "publish")]
    Published,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Scheduled => "scheduled",
            PostStatus::Published => "published",
        }
    }

    /// Parse status from its string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Some(PostStatus::Draft),
            "scheduled" | "future" => Some(PostStatus::Scheduled),
            "published" | "publish" => Some(PostStatus::Published),
            _ => None,
        }
    }
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Partial post record
///
/// Used for saves (every `Some` field overwrites the matched record), for
/// snapshot documents and for bulk imports. Snapshot and import records may
/// reference their category and tags by slug instead of id.
///
/// Fields that are nullable on `Post` are doubly optional here: a missing key
/// leaves the stored value alone, an explicit `null` clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PostInput {
    #[serde(default, deserialize_with = "lenient_id::option::deserialize", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(
        default,
        alias = "legacy_wp_id",
        deserialize_with = "lenient_id::option::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub legacy_id: Option<String>,
    #[serde(
        default,
        alias = "legacy_wp_url",
        deserialize_with = "nullable::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub legacy_url: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PostStatus>,
    #[serde(default, with = "timestamp::nullable", skip_serializing_if = "Option::is_none")]
    pub published_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, with = "timestamp::option", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "lenient_id::nullable::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub category_id: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Category reference by slug (snapshot / import records)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_slug: Option<String>,
    /// Tag references by slug (snapshot / import records)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_slugs: Option<Vec<String>>,
    #[serde(default, deserialize_with = "nullable::deserialize", skip_serializing_if = "Option::is_none")]
    pub featured_image_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable::deserialize", skip_serializing_if = "Option::is_none")]
    pub featured_image_alt: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable::deserialize", skip_serializing_if = "Option::is_none")]
    pub meta_title: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable::deserialize", skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable::deserialize", skip_serializing_if = "Option::is_none")]
    pub author_name: Option<Option<String>>,
}

impl PostInput {
    /// Create an input carrying only a title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_legacy_id(mut self, legacy_id: impl Into<String>) -> Self {
        self.legacy_id = Some(legacy_id.into());
        self
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_status(mut self, status: PostStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = Some(Some(published_at));
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn with_category_id(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(Some(category_id.into()));
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    /// Shallow-merge every `Some` field over `post`; `Some(None)` clears.
    ///
    /// `id`, `slug`, timestamps other than `published_at` and the reading time
    /// are left to the caller, which owns identity and derived fields.
    pub fn apply_to(&self, post: &mut Post) {
        if let Some(ref legacy_id) = self.legacy_id {
            post.legacy_id = Some(legacy_id.clone());
        }
        if let Some(ref legacy_url) = self.legacy_url {
            post.legacy_url = legacy_url.clone();
        }
        if let Some(ref title) = self.title {
            post.title = title.clone();
        }
        if let Some(ref excerpt) = self.excerpt {
            post.excerpt = excerpt.clone();
        }
        if let Some(ref content) = self.content {
            post.content = content.clone();
        }
        if let Some(status) = self.status {
            post.status = status;
        }
        if let Some(published_at) = self.published_at {
            post.published_at = published_at;
        }
        if let Some(ref category_id) = self.category_id {
            post.category_id = category_id.clone();
        }
        if let Some(ref tags) = self.tags {
            post.tags = tags.clone();
        }
        if let Some(ref url) = self.featured_image_url {
            post.featured_image_url = url.clone();
        }
        if let Some(ref alt) = self.featured_image_alt {
            post.featured_image_alt = alt.clone();
        }
        if let Some(ref meta_title) = self.meta_title {
            post.meta_title = meta_title.clone();
        }
        if let Some(ref meta_description) = self.meta_description {
            post.meta_description = meta_description.clone();
        }
        if let Some(ref author_name) = self.author_name {
            post.author_name = author_name.clone();
        }
    }
}

/// Filters for post searches
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchFilters {
    /// Restrict to a status; when absent only published posts are searched
    #[serde(default)]
    pub status: Option<PostStatus>,
    /// Category id
    #[serde(default)]
    pub category: Option<String>,
    /// Tag id
    #[serde(default)]
    pub tag: Option<String>,
}
