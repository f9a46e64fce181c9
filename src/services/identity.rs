//! Identity and slug utilities
//!
//! Pure helpers shared by every write path:
//! - id generation
//! - slug generation and per-kind uniqueness
//! - reading time estimation
//! - display date formatting

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{Category, Post, Tag, DEFAULT_READING_TIME_MINUTES};

/// Words read per minute when estimating reading time
const WORDS_PER_MINUTE: usize = 200;

static SLUG_STRIP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9_\s-]").expect("valid slug strip pattern"));
static SLUG_SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s_-]+").expect("valid slug separator pattern"));

/// A record with an id and a slug that must be unique within its kind
pub trait Sluggable {
    fn record_id(&self) -> &str;
    fn record_slug(&self) -> &str;
}

impl Sluggable for Post {
    fn record_id(&self) -> &str {
        &self.id
    }
    fn record_slug(&self) -> &str {
        &self.slug
    }
}

impl Sluggable for Category {
    fn record_id(&self) -> &str {
        &self.id
    }
    fn record_slug(&self) -> &str {
        &self.slug
    }
}

impl Sluggable for Tag {
    fn record_id(&self) -> &str {
        &self.id
    }
    fn record_slug(&self) -> &str {
        &self.slug
    }
}

/// Generate a new unique record id
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Generate a URL-friendly slug from a title or name
///
/// Lowercases, drops everything except ASCII letters, digits, whitespace,
/// underscores and hyphens, then collapses runs of separators into a single
/// hyphen and trims hyphens from both ends.
pub fn generate_slug(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    let stripped = SLUG_STRIP.replace_all(&lowered, "");
    let joined = SLUG_SEPARATORS.replace_all(&stripped, "-");
    joined.trim_matches('-').to_string()
}

/// Make `desired` unique among `records`, ignoring the record `own_id`.
///
/// Appends `-1`, `-2`, … to the original slug until no other record holds it.
pub fn ensure_unique_slug<T: Sluggable>(desired: &str, records: &[T], own_id: Option<&str>) -> String {
    let taken = |slug: &str| {
        records
            .iter()
            .any(|r| r.record_slug() == slug && Some(r.record_id()) != own_id)
    };

    if !taken(desired) {
        return desired.to_string();
    }

    let mut counter = 1;
    loop {
        let candidate = format!("{}-{}", desired, counter);
        if !taken(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Estimated reading time in minutes
///
/// `ceil(words / 200)`, at least 1 for non-blank content. Missing or blank
/// content yields the default of 5.
pub fn calculate_reading_time(content: Option<&str>) -> u32 {
    let words = match content {
        Some(text) if !text.trim().is_empty() => text.split_whitespace().count(),
        _ => return DEFAULT_READING_TIME_MINUTES,
    };
    (words.div_ceil(WORDS_PER_MINUTE).max(1)) as u32
}

/// Long British date, e.g. `5 March 2024`; empty when absent
pub fn format_date(ts: Option<&DateTime<Utc>>) -> String {
    match ts {
        Some(dt) => dt.format("%-d %B %Y").to_string(),
        None => String::new(),
    }
}
