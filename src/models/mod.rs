//! Data models
//!
//! This module contains the data structures used throughout the blog data layer:
//! - Entities (Post, Category, Tag)
//! - Partial inputs for saves and imports
//! - Dataset / snapshot document types shared by every data source

mod category;
mod dataset;
mod post;
pub mod serde_helpers;
mod tag;

pub use category::{Category, CategoryInput};
pub use dataset::{Dataset, EntityKind, ImportFailure, ImportStats, Records, SnapshotDocument};
pub use post::{Post, PostInput, PostStatus, SearchFilters, DEFAULT_READING_TIME_MINUTES};
pub use tag::{Tag, TagInput};
