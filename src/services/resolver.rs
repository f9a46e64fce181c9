//! Post identity resolution
//!
//! A post may be known by its id, by the id it had in the system it was
//! migrated from, or by its slug. Saves match on the first two; snapshot
//! merging also considers the slug.

use crate::models::Post;

/// Which key matched an existing post, with that post's index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityMatch {
    ById(usize),
    ByLegacyId(usize),
    BySlug(usize),
    NoMatch,
}

impl IdentityMatch {
    /// Index of the matched post, if any
    pub fn index(&self) -> Option<usize> {
        match *self {
            IdentityMatch::ById(i) | IdentityMatch::ByLegacyId(i) | IdentityMatch::BySlug(i) => Some(i),
            IdentityMatch::NoMatch => None,
        }
    }

    pub fn is_match(&self) -> bool {
        !matches!(self, IdentityMatch::NoMatch)
    }
}

/// Identity keys to look up; `None` keys are skipped
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityKey<'a> {
    pub id: Option<&'a str>,
    pub legacy_id: Option<&'a str>,
    pub slug: Option<&'a str>,
}

impl<'a> IdentityKey<'a> {
    /// Every key a post carries
    pub fn of(post: &'a Post) -> Self {
        Self {
            id: Some(post.id.as_str()),
            legacy_id: post.legacy_id.as_deref(),
            slug: Some(post.slug.as_str()),
        }
    }
}

/// Resolve `key` against `posts`, checking id, then legacy id, then slug
pub fn resolve(key: IdentityKey<'_>, posts: &[Post]) -> IdentityMatch {
    fn non_empty(v: Option<&str>) -> Option<&str> {
        v.filter(|s| !s.is_empty())
    }

    if let Some(id) = non_empty(key.id) {
        if let Some(i) = posts.iter().position(|p| p.id == id) {
            return IdentityMatch::ById(i);
        }
    }

    if let Some(legacy_id) = non_empty(key.legacy_id) {
        if let Some(i) = posts
            .iter()
            .position(|p| p.legacy_id.as_deref() == Some(legacy_id))
        {
            return IdentityMatch::ByLegacyId(i);
        }
    }

    if let Some(slug) = non_empty(key.slug) {
        if let Some(i) = posts.iter().position(|p| p.slug == slug) {
            return IdentityMatch::BySlug(i);
        }
    }

    IdentityMatch::NoMatch
}
