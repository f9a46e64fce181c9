//! Blog service
//!
//! The public data-access API. Every call makes sure the cache has been
//! loaded once, then answers from it. Writes are applied to the cache first
//! so readers see them immediately; when a hosted backend is configured its
//! answer is authoritative, and a failed hosted write is undone locally and
//! returned to the caller.
//!
//! Taxonomy, media and import/export operations live in sibling modules as
//! further `impl BlogService` blocks.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

use crate::backend::{create_backend, BackendError, HostedBackend, ObjectStore};
use crate::cache::{create_local_store, DataCache};
use crate::config::Config;
use crate::models::{EntityKind, Post, PostInput, SearchFilters};
use crate::services::identity::{
    calculate_reading_time, ensure_unique_slug, generate_id, generate_slug, Sluggable,
};
use crate::services::reconcile::{build_pipeline, LoadOutcome, Reconciler};
use crate::services::resolver::{resolve, IdentityKey, IdentityMatch};
use crate::sources::SnapshotSource;

/// Slug used when a title yields no usable characters
pub(crate) const FALLBACK_SLUG: &str = "untitled";

/// Error types for blog service operations
#[derive(Debug, thiserror::Error)]
pub enum BlogError {
    /// Record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Validation error: {0}")]
    Validation(String),

    /// The hosted backend rejected or failed a write
    #[error("Hosted backend error: {0}")]
    Backend(#[from] BackendError),

    /// A capability needs configuration that is missing
    #[error("Not configured: {0}")]
    NotConfigured(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// How to revert an optimistic cache change
pub(crate) enum Undo<T> {
    /// Drop the record that was added
    Remove(String),
    /// Put back the record as it was before an update
    Restore(T),
    /// Put back a deleted record at its old position
    Reinsert(usize, T),
}

impl<T: Sluggable + Clone> Undo<T> {
    pub(crate) fn apply(self, records: &mut Vec<T>) {
        match self {
            Undo::Remove(id) => records.retain(|r| r.record_id() != id),
            Undo::Restore(previous) => {
                match records.iter().position(|r| r.record_id() == previous.record_id()) {
                    Some(i) => records[i] = previous,
                    None => records.push(previous),
                }
            }
            Undo::Reinsert(index, previous) => {
                if !records.iter().any(|r| r.record_id() == previous.record_id()) {
                    records.insert(index.min(records.len()), previous);
                }
            }
        }
    }
}

/// Replace the record with `id` by `record`
pub(crate) fn replace_by_id<T: Sluggable>(records: &mut [T], id: &str, record: T) {
    if let Some(slot) = records.iter_mut().find(|r| r.record_id() == id) {
        *slot = record;
    }
}

/// Blog data-access service
pub struct BlogService {
    pub(crate) cache: Arc<DataCache>,
    reconciler: Reconciler,
    pub(crate) backend: Option<Arc<dyn HostedBackend>>,
    pub(crate) objects: Option<Arc<dyn ObjectStore>>,
    pub(crate) image_folder: String,
}

impl BlogService {
    /// Create a service over `cache`
    ///
    /// The load pipeline is hosted backend (when given), then `snapshot`
    /// (when given), then the cache's own local store.
    pub fn new(
        cache: Arc<DataCache>,
        backend: Option<Arc<dyn HostedBackend>>,
        snapshot: Option<SnapshotSource>,
        timeout: Duration,
    ) -> Self {
        let sources = build_pipeline(backend.clone(), snapshot, cache.store().clone());
        Self {
            reconciler: Reconciler::new(cache.clone(), sources, timeout),
            cache,
            backend,
            objects: None,
            image_folder: "blog".to_string(),
        }
    }

    /// Attach image storage
    pub fn with_object_store(mut self, objects: Arc<dyn ObjectStore>, folder: impl Into<String>) -> Self {
        self.objects = Some(objects);
        self.image_folder = folder.into();
        self
    }

    /// Build the service described by `config`
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        use anyhow::Context;

        let timeout = config.sources.timeout();
        let store = create_local_store(&config.storage)
            .await
            .context("Failed to open local store")?;
        let cache = Arc::new(DataCache::open(store).await);

        let supabase = create_backend(&config.backend, timeout).context("Failed to create hosted backend client")?;
        let snapshot = if config.snapshot.is_enabled() {
            Some(SnapshotSource::new(config.snapshot.source.clone(), timeout)?)
        } else {
            None
        };

        match supabase {
            Some(supabase) => {
                tracing::info!("Hosted backend configured");
                let backend: Arc<dyn HostedBackend> = supabase.clone();
                let objects: Arc<dyn ObjectStore> = supabase;
                Ok(Self::new(cache, Some(backend), snapshot, timeout)
                    .with_object_store(objects, config.backend.image_folder.clone()))
            }
            None => {
                tracing::info!("No hosted backend configured, using snapshot and local cache");
                Ok(Self::new(cache, None, snapshot, timeout))
            }
        }
    }

    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Load the cache once; later calls return the memoized outcome
    pub async fn ensure_loaded(&self) -> LoadOutcome {
        self.reconciler.ensure_loaded().await
    }

    /// Drop the memoized load so the next call re-reads every source
    pub async fn reset_cache(&self) {
        self.reconciler.reset().await;
    }

    // ========================================================================
    // Post reads
    // ========================================================================

    /// Every post, any status
    pub async fn get_all_posts(&self) -> Vec<Post> {
        self.ensure_loaded().await;
        self.cache.posts()
    }

    pub async fn get_published_posts(&self) -> Vec<Post> {
        self.ensure_loaded().await;
        let mut posts = self.cache.posts();
        posts.retain(Post::is_published);
        posts
    }

    pub async fn get_post_by_id(&self, id: &str) -> Option<Post> {
        self.ensure_loaded().await;
        self.cache.find_post(|p| p.id == id)
    }

    /// Published post with the given slug
    pub async fn get_post_by_slug(&self, slug: &str) -> Option<Post> {
        self.ensure_loaded().await;
        self.cache.find_post(|p| p.slug == slug && p.is_published())
    }

    /// Search posts
    ///
    /// Without a status filter only published posts are searched. `query` is
    /// matched case-insensitively against title, excerpt and content. Results
    /// are newest first by publish date (creation date when unpublished),
    /// ties broken by creation date.
    pub async fn search_posts(&self, query: &str, filters: &SearchFilters) -> Vec<Post> {
        self.ensure_loaded().await;

        let needle = query.trim().to_lowercase();
        let mut posts: Vec<Post> = self
            .cache
            .posts()
            .into_iter()
            .filter(|p| match filters.status {
                Some(status) => p.status == status,
                None => p.is_published(),
            })
            .filter(|p| {
                filters
                    .category
                    .as_deref()
                    .map_or(true, |c| p.category_id.as_deref() == Some(c))
            })
            .filter(|p| filters.tag.as_ref().map_or(true, |t| p.tags.contains(t)))
            .filter(|p| needle.is_empty() || p.matches_query(&needle))
            .collect();

        posts.sort_by(|a, b| {
            b.sort_key()
                .cmp(&a.sort_key())
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        posts
    }

    // ========================================================================
    // Post writes
    // ========================================================================

    /// Create or update a post
    ///
    /// The target is found by `id`, then `legacy_id`. Updates merge every
    /// given field; creates fill in id, unique slug, reading time and
    /// timestamps.
    pub async fn save_post(&self, input: PostInput) -> Result<Post, BlogError> {
        self.ensure_loaded().await;

        let (saved, undo) = self.cache.patch_posts(|posts| apply_post_input(posts, &input))?;

        let Some(ref backend) = self.backend else {
            self.cache.persist(EntityKind::Posts).await;
            return Ok(saved);
        };

        match backend.upsert_post(&saved).await {
            Ok(mut stored) => {
                stored.tags = saved.tags.clone();
                self.cache
                    .patch_posts(|posts| replace_by_id(posts, &saved.id, stored.clone()));
                self.cache.persist(EntityKind::Posts).await;
                Ok(stored)
            }
            Err(e) => {
                tracing::error!("Failed to save post {} to hosted backend: {}", saved.id, e);
                self.cache.patch_posts(|posts| undo.apply(posts));
                Err(e.into())
            }
        }
    }

    /// Delete a post locally and, when configured, from the hosted backend
    pub async fn delete_post(&self, id: &str) -> Result<(), BlogError> {
        self.ensure_loaded().await;

        let removed = self.cache.patch_posts(|posts| {
            posts
                .iter()
                .position(|p| p.id == id)
                .map(|i| (i, posts.remove(i)))
        });
        let Some((index, previous)) = removed else {
            return Err(BlogError::NotFound(format!("post {}", id)));
        };

        if let Some(ref backend) = self.backend {
            if let Err(e) = backend.delete_post(id).await {
                tracing::error!("Failed to delete post {} from hosted backend: {}", id, e);
                self.cache
                    .patch_posts(|posts| Undo::Reinsert(index, previous).apply(posts));
                return Err(e.into());
            }
        }

        self.cache.persist(EntityKind::Posts).await;
        Ok(())
    }
}

/// Apply a save to the cached posts, returning the result and how to undo it
fn apply_post_input(posts: &mut Vec<Post>, input: &PostInput) -> Result<(Post, Undo<Post>), BlogError> {
    let now = Utc::now();
    let key = IdentityKey {
        id: input.id.as_deref(),
        legacy_id: input.legacy_id.as_deref(),
        slug: None,
    };

    match resolve(key, posts) {
        IdentityMatch::ById(i) | IdentityMatch::ByLegacyId(i) => {
            let previous = posts[i].clone();
            let mut post = previous.clone();
            input.apply_to(&mut post);

            if let Some(ref slug) = input.slug {
                let desired = generate_slug(slug);
                if !desired.is_empty() && desired != previous.slug {
                    post.slug = ensure_unique_slug(&desired, posts, Some(&previous.id));
                }
            }
            if input.content.as_ref().is_some_and(|c| *c != previous.content) {
                post.reading_time_minutes = calculate_reading_time(Some(&post.content));
            }
            post.updated_at = now;

            posts[i] = post.clone();
            Ok((post, Undo::Restore(previous)))
        }
        IdentityMatch::BySlug(_) | IdentityMatch::NoMatch => {
            let title = input.title.as_deref().map(str::trim).unwrap_or_default();
            if title.is_empty() && input.slug.is_none() {
                return Err(BlogError::Validation("Post title is required".into()));
            }

            let id = input
                .id
                .clone()
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(generate_id);
            let desired = input
                .slug
                .as_deref()
                .map(generate_slug)
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| generate_slug(title));
            let desired = if desired.is_empty() { FALLBACK_SLUG.to_string() } else { desired };
            let slug = ensure_unique_slug(&desired, posts, None);

            let mut post = Post::new(id, slug, title.to_string());
            input.apply_to(&mut post);
            post.reading_time_minutes = calculate_reading_time(input.content.as_deref());
            post.created_at = input.created_at.unwrap_or(now);
            post.updated_at = now;

            posts.push(post.clone());
            Ok((post.clone(), Undo::Remove(post.id)))
        }
    }
}
