//! Dataset types
//!
//! A `Dataset` is the unit every data source produces and the unit the
//! in-memory cache holds. `SnapshotDocument` is the static JSON file shape,
//! whose posts may reference taxonomy by slug.

use serde::{Deserialize, Serialize};

use super::{Category, Post, PostInput, Tag};

/// Posts, categories and tags loaded from a single source
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Dataset {
    #[serde(default)]
    pub posts: Vec<Post>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Dataset {
    pub fn new(posts: Vec<Post>, categories: Vec<Category>, tags: Vec<Tag>) -> Self {
        Self {
            posts,
            categories,
            tags,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty() && self.categories.is_empty() && self.tags.is_empty()
    }

    /// Seed built-in categories and tags where a kind is empty.
    ///
    /// Returns true if anything was seeded.
    pub fn seed_default_taxonomy(&mut self) -> bool {
        let mut seeded = false;
        if self.categories.is_empty() {
            self.categories = Category::defaults();
            seeded = true;
        }
        if self.tags.is_empty() {
            self.tags = Tag::defaults();
            seeded = true;
        }
        seeded
    }

    /// Look up a category id by slug
    pub fn category_id_for_slug(&self, slug: &str) -> Option<&str> {
        self.categories
            .iter()
            .find(|c| c.slug == slug)
            .map(|c| c.id.as_str())
    }

    /// Look up a tag id by slug
    pub fn tag_id_for_slug(&self, slug: &str) -> Option<&str> {
        self.tags.iter().find(|t| t.slug == slug).map(|t| t.id.as_str())
    }
}

/// Static snapshot document: `{ posts, categories, tags }`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SnapshotDocument {
    #[serde(default)]
    pub posts: Vec<PostInput>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// The three record kinds the cache holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Posts,
    Categories,
    Tags,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::Posts, EntityKind::Categories, EntityKind::Tags];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Posts => "posts",
            EntityKind::Categories => "categories",
            EntityKind::Tags => "tags",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Records of one kind, as handed out by cache snapshots
#[derive(Debug, Clone, PartialEq)]
pub enum Records {
    Posts(Vec<Post>),
    Categories(Vec<Category>),
    Tags(Vec<Tag>),
}

impl Records {
    pub fn kind(&self) -> EntityKind {
        match self {
            Records::Posts(_) => EntityKind::Posts,
            Records::Categories(_) => EntityKind::Categories,
            Records::Tags(_) => EntityKind::Tags,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Records::Posts(v) => v.len(),
            Records::Categories(v) => v.len(),
            Records::Tags(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Outcome of a bulk import
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ImportStats {
    pub posts_imported: usize,
    pub posts_updated: usize,
    pub categories_created: usize,
    pub tags_created: usize,
    pub errors: Vec<ImportFailure>,
}

/// A record that failed to import
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImportFailure {
    /// Title or slug of the failing post, or the failing category/tag
    pub post: String,
    pub error: String,
}
