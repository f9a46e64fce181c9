//! bwblog - blog data layer
//!
//! Reads blog posts, categories and tags from a hosted backend, a static
//! snapshot or a local cache, whichever answers first, and keeps an
//! in-memory copy that every read is served from.

pub mod api;
pub mod backend;
pub mod cache;
pub mod config;
pub mod models;
pub mod services;
pub mod sources;

#[cfg(test)]
mod test_support;
