//! Category model
//!
//! Categories form a flat namespace; a post references at most one of them
//! by id.

use serde::{Deserialize, Serialize};

use super::serde_helpers::lenient_id;

/// Category entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    /// Unique identifier
    #[serde(deserialize_with = "lenient_id::deserialize")]
    pub id: String,
    /// Display name
    pub name: String,
    /// URL-friendly slug, unique among categories
    pub slug: String,
}

impl Category {
    pub fn new(id: impl Into<String>, name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            slug: slug.into(),
        }
    }

    /// Built-in categories seeded when no source provides any
    pub fn defaults() -> Vec<Category> {
        [
            ("tax", "Tax"),
            ("accounts", "Accounts"),
            ("advisory", "Advisory"),
            ("business", "Business"),
            ("news", "News"),
        ]
        .into_iter()
        .map(|(slug, name)| Category::new(slug, name, slug))
        .collect()
    }
}

/// Input for creating or updating a category
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CategoryInput {
    /// Existing or desired id; a new one is generated when absent
    #[serde(default, deserialize_with = "lenient_id::option::deserialize")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Derived from the name when absent
    #[serde(default)]
    pub slug: Option<String>,
}

impl CategoryInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: Some(name.into()),
            slug: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }
}
