//! Tag model
//!
//! Tags are used to group posts across categories. A post references any
//! number of tags by id.

use serde::{Deserialize, Serialize};

use super::serde_helpers::lenient_id;

/// Tag entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tag {
    /// Unique identifier
    #[serde(deserialize_with = "lenient_id::deserialize")]
    pub id: String,
    /// Tag name
    pub name: String,
    /// URL-friendly slug, unique among tags
    pub slug: String,
}

impl Tag {
    pub fn new(id: impl Into<String>, name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            slug: slug.into(),
        }
    }

    /// Built-in tags seeded when no source provides any
    pub fn defaults() -> Vec<Tag> {
        [
            ("self-assessment", "Self Assessment"),
            ("vat", "VAT"),
            ("corporation-tax", "Corporation Tax"),
            ("planning", "Planning"),
            ("compliance", "Compliance"),
        ]
        .into_iter()
        .map(|(slug, name)| Tag::new(slug, name, slug))
        .collect()
    }
}

/// Input for creating or updating a tag
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TagInput {
    #[serde(default, deserialize_with = "lenient_id::option::deserialize")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
}

impl TagInput {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tags() {
        let defaults = Tag::defaults();
        assert_eq!(defaults.len(), 5);
        assert!(defaults.iter().any(|t| t.slug == "vat" && t.name == "VAT"));
    }

    #[test]
    fn test_tag_input_builder() {
        let input = TagInput::new("Payroll").with_id("t9").with_slug("payroll");
        assert_eq!(input.id.as_deref(), Some("t9"));
        assert_eq!(input.name.as_deref(), Some("Payroll"));
        assert_eq!(input.slug.as_deref(), Some("payroll"));
    }
}
