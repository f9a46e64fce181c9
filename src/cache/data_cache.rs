//! In-memory data cache
//!
//! Holds the data set produced by the most recent successful load. Reads
//! never touch I/O; writes patch the in-memory copy synchronously and persist
//! to the local store afterwards, best-effort.

use anyhow::Result;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{slot_key, LocalStore, StoreLayer, LOADED_FROM_SNAPSHOT_KEY};
use crate::models::{Category, Dataset, EntityKind, Post, Records, Tag};

/// Read every persisted slot; missing slots read as empty
pub async fn read_persisted(store: &LocalStore) -> Result<Dataset> {
    let posts: Option<Vec<Post>> = store.get(slot_key(EntityKind::Posts)).await?;
    let categories: Option<Vec<Category>> = store.get(slot_key(EntityKind::Categories)).await?;
    let tags: Option<Vec<Tag>> = store.get(slot_key(EntityKind::Tags)).await?;

    Ok(Dataset::new(
        posts.unwrap_or_default(),
        categories.unwrap_or_default(),
        tags.unwrap_or_default(),
    ))
}

/// In-memory snapshot of posts, categories and tags
pub struct DataCache {
    store: Arc<LocalStore>,
    data: RwLock<Dataset>,
}

impl std::fmt::Debug for DataCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data = self.read();
        f.debug_struct("DataCache")
            .field("posts", &data.posts.len())
            .field("categories", &data.categories.len())
            .field("tags", &data.tags.len())
            .finish()
    }
}

impl DataCache {
    /// Open a cache over `store`, hydrated from whatever it last persisted
    pub async fn open(store: Arc<LocalStore>) -> Self {
        let data = match read_persisted(&store).await {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("Ignoring unreadable local cache: {:#}", e);
                Dataset::default()
            }
        };

        Self {
            store,
            data: RwLock::new(data),
        }
    }

    /// The underlying persisted store
    pub fn store(&self) -> &Arc<LocalStore> {
        &self.store
    }

    // Lock poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, Dataset> {
        self.data.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Dataset> {
        self.data.write().unwrap_or_else(|e| e.into_inner())
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Current records of one kind
    pub fn snapshot(&self, kind: EntityKind) -> Records {
        let data = self.read();
        match kind {
            EntityKind::Posts => Records::Posts(data.posts.clone()),
            EntityKind::Categories => Records::Categories(data.categories.clone()),
            EntityKind::Tags => Records::Tags(data.tags.clone()),
        }
    }

    pub fn posts(&self) -> Vec<Post> {
        self.read().posts.clone()
    }

    pub fn categories(&self) -> Vec<Category> {
        self.read().categories.clone()
    }

    pub fn tags(&self) -> Vec<Tag> {
        self.read().tags.clone()
    }

    /// The whole data set
    pub fn dataset(&self) -> Dataset {
        self.read().clone()
    }

    /// Find a post without cloning the collection
    pub fn find_post(&self, pred: impl Fn(&Post) -> bool) -> Option<Post> {
        self.read().posts.iter().find(|p| pred(p)).cloned()
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Replace the whole data set
    pub fn replace(&self, dataset: Dataset) {
        *self.write() = dataset;
    }

    pub fn patch_posts<R>(&self, f: impl FnOnce(&mut Vec<Post>) -> R) -> R {
        f(&mut self.write().posts)
    }

    pub fn patch_categories<R>(&self, f: impl FnOnce(&mut Vec<Category>) -> R) -> R {
        f(&mut self.write().categories)
    }

    pub fn patch_tags<R>(&self, f: impl FnOnce(&mut Vec<Tag>) -> R) -> R {
        f(&mut self.write().tags)
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Write one kind to the local store; failures are logged only
    pub async fn persist(&self, kind: EntityKind) {
        let records = self.snapshot(kind);
        let key = slot_key(kind);
        let result = match &records {
            Records::Posts(posts) => self.store.set(key, posts).await,
            Records::Categories(categories) => self.store.set(key, categories).await,
            Records::Tags(tags) => self.store.set(key, tags).await,
        };

        match result {
            Ok(()) => tracing::debug!("Persisted {} {}", records.len(), kind),
            Err(e) => tracing::warn!("Failed to persist {}: {:#}", kind, e),
        }
    }

    /// Write every kind to the local store
    pub async fn persist_all(&self) {
        for kind in EntityKind::ALL {
            self.persist(kind).await;
        }
    }

    /// Record whether the cached data came from the static snapshot
    pub async fn set_loaded_from_snapshot(&self, loaded: bool) {
        if let Err(e) = self.store.set(LOADED_FROM_SNAPSHOT_KEY, &loaded).await {
            tracing::warn!("Failed to persist snapshot flag: {:#}", e);
        }
    }

    pub async fn loaded_from_snapshot(&self) -> bool {
        let flag: Result<Option<bool>> = self.store.get(LOADED_FROM_SNAPSHOT_KEY).await;
        match flag {
            Ok(flag) => flag.unwrap_or(false),
            Err(e) => {
                tracing::warn!("Failed to read snapshot flag: {:#}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{FileStore, MemoryStore};

    fn memory_store() -> Arc<LocalStore> {
        Arc::new(LocalStore::Memory(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_empty_store_gives_empty_snapshots() {
        let cache = DataCache::open(memory_store()).await;
        assert!(cache.snapshot(EntityKind::Posts).is_empty());
        assert!(cache.snapshot(EntityKind::Categories).is_empty());
        assert!(cache.snapshot(EntityKind::Tags).is_empty());
        assert!(!cache.loaded_from_snapshot().await);
    }

    #[tokio::test]
    async fn test_persist_then_hydrate_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LocalStore::File(FileStore::new(dir.path())));

        let cache = DataCache::open(store.clone()).await;
        cache.replace(Dataset::new(
            vec![Post::new("p1".into(), "hello".into(), "Hello".into())],
            Category::defaults(),
            Tag::defaults(),
        ));
        cache.persist_all().await;
        cache.set_loaded_from_snapshot(true).await;

        let reopened = DataCache::open(Arc::new(LocalStore::File(FileStore::new(dir.path())))).await;
        assert_eq!(reopened.posts().len(), 1);
        assert_eq!(reopened.categories(), Category::defaults());
        assert_eq!(reopened.tags(), Tag::defaults());
        assert!(reopened.loaded_from_snapshot().await);
    }

    #[tokio::test]
    async fn test_patch_is_visible_immediately() {
        let cache = DataCache::open(memory_store()).await;
        let len = cache.patch_posts(|posts| {
            posts.push(Post::new("p1".into(), "a".into(), "A".into()));
            posts.len()
        });

        assert_eq!(len, 1);
        assert!(cache.find_post(|p| p.id == "p1").is_some());
        assert_eq!(cache.snapshot(EntityKind::Posts).kind(), EntityKind::Posts);
    }

    #[tokio::test]
    async fn test_unreadable_store_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("baw_blog_posts.json"), "[{").unwrap();
        let store = Arc::new(LocalStore::File(FileStore::new(dir.path())));

        let cache = DataCache::open(store).await;
        assert!(cache.posts().is_empty());
    }
}
