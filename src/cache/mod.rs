//! Local cache layer
//!
//! Two pieces live here:
//! - `LocalStore`: the persisted key-value mirror of the last-known-good
//!   data set (file, memory or Redis driver)
//! - `DataCache`: the in-memory view every read is answered from, hydrated
//!   from and persisted to a `LocalStore`
//!
//! The store driver is selected based on configuration.
//!
//! # Usage
//!
//! ```rust,ignore
//! use bwblog::cache::{create_local_store, DataCache};
//! use bwblog::config::StorageConfig;
//!
//! let store = create_local_store(&StorageConfig::default()).await?;
//! let cache = DataCache::open(store).await;
//! let posts = cache.posts();
//! ```

mod data_cache;
pub mod file;
pub mod memory;
#[cfg(feature = "redis-cache")]
pub mod redis;

use anyhow::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

use crate::config::{StorageConfig, StorageDriver};
use crate::models::EntityKind;

pub use data_cache::{read_persisted, DataCache};
pub use file::FileStore;
pub use memory::MemoryStore;
#[cfg(feature = "redis-cache")]
pub use redis::RedisStore;

/// Slot holding the cached posts
pub const POSTS_KEY: &str = "baw_blog_posts";
/// Slot holding the cached categories
pub const CATEGORIES_KEY: &str = "baw_blog_categories";
/// Slot holding the cached tags
pub const TAGS_KEY: &str = "baw_blog_tags";
/// Flag recording whether the cached data came from the static snapshot
pub const LOADED_FROM_SNAPSHOT_KEY: &str = "baw_data_loaded_from_json";

/// Storage slot for a record kind
pub fn slot_key(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Posts => POSTS_KEY,
        EntityKind::Categories => CATEGORIES_KEY,
        EntityKind::Tags => TAGS_KEY,
    }
}

/// Persisted key-value store trait
///
/// Values are stored as JSON documents. The generic methods make this trait
/// unusable as `dyn StoreLayer`; use the `LocalStore` enum for runtime
/// polymorphism.
#[async_trait]
pub trait StoreLayer: Send + Sync {
    /// Read and decode a slot; `Ok(None)` when it was never written
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>>;

    /// Encode and write a slot, replacing any previous value
    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T) -> Result<()>;
}

/// Unified local store enum for runtime polymorphism
#[derive(Debug)]
pub enum LocalStore {
    /// JSON files in a directory
    File(FileStore),
    /// Process memory (moka)
    Memory(MemoryStore),
    /// Redis
    #[cfg(feature = "redis-cache")]
    Redis(RedisStore),
}

#[async_trait]
impl StoreLayer for LocalStore {
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>> {
        match self {
            LocalStore::File(store) => store.get(key).await,
            LocalStore::Memory(store) => store.get(key).await,
            #[cfg(feature = "redis-cache")]
            LocalStore::Redis(store) => store.get(key).await,
        }
    }

    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T) -> Result<()> {
        match self {
            LocalStore::File(store) => store.set(key, value).await,
            LocalStore::Memory(store) => store.set(key, value).await,
            #[cfg(feature = "redis-cache")]
            LocalStore::Redis(store) => store.set(key, value).await,
        }
    }
}

/// Create a local store based on configuration
///
/// - `StorageDriver::File` - JSON files under `config.path`
/// - `StorageDriver::Memory` - in-process store, lost on restart
/// - `StorageDriver::Redis` - Redis (requires the `redis-cache` feature)
///
/// # Errors
/// - Returns an error if Redis is configured but the `redis-cache` feature is not enabled
/// - Returns an error if the Redis connection fails
pub async fn create_local_store(config: &StorageConfig) -> Result<Arc<LocalStore>> {
    match config.driver {
        StorageDriver::File => Ok(Arc::new(LocalStore::File(FileStore::new(&config.path)))),
        StorageDriver::Memory => Ok(Arc::new(LocalStore::Memory(MemoryStore::new()))),
        StorageDriver::Redis => {
            #[cfg(feature = "redis-cache")]
            {
                let redis_url = config.redis_url.as_ref().ok_or_else(|| {
                    anyhow::anyhow!(
                        "Redis URL is required when using the redis storage driver. \
                         Set 'storage.redis_url' or the BWBLOG_STORAGE_REDIS_URL environment variable."
                    )
                })?;

                let store = RedisStore::connect(redis_url).await?;
                Ok(Arc::new(LocalStore::Redis(store)))
            }

            #[cfg(not(feature = "redis-cache"))]
            {
                anyhow::bail!(
                    "Redis storage driver is configured but the 'redis-cache' feature is not enabled. \
                     Either enable the feature with `--features redis-cache` or use the 'file' driver."
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    #[tokio::test]
    async fn test_create_memory_store() {
        let config = StorageConfig {
            driver: StorageDriver::Memory,
            ..StorageConfig::default()
        };
        let store = create_local_store(&config).await.unwrap();

        store.set(CATEGORIES_KEY, &Category::defaults()).await.unwrap();
        let result: Option<Vec<Category>> = store.get(CATEGORIES_KEY).await.unwrap();
        assert_eq!(result, Some(Category::defaults()));
    }

    #[tokio::test]
    async fn test_create_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            driver: StorageDriver::File,
            path: dir.path().join("cache"),
            redis_url: None,
        };

        let store = create_local_store(&config).await.unwrap();
        store.set(LOADED_FROM_SNAPSHOT_KEY, &true).await.unwrap();
        drop(store);

        let reopened = create_local_store(&config).await.unwrap();
        let flag: Option<bool> = reopened.get(LOADED_FROM_SNAPSHOT_KEY).await.unwrap();
        assert_eq!(flag, Some(true));
    }

    #[test]
    fn test_slot_keys() {
        assert_eq!(slot_key(EntityKind::Posts), "baw_blog_posts");
        assert_eq!(slot_key(EntityKind::Categories), "baw_blog_categories");
        assert_eq!(slot_key(EntityKind::Tags), "baw_blog_tags");
    }

    #[cfg(not(feature = "redis-cache"))]
    #[tokio::test]
    async fn test_create_redis_store_without_feature() {
        let config = StorageConfig {
            driver: StorageDriver::Redis,
            redis_url: Some("redis://localhost:6379".to_string()),
            ..StorageConfig::default()
        };

        let err = create_local_store(&config).await.unwrap_err().to_string();
        assert!(err.contains("redis-cache") && err.contains("feature"));
    }

    #[cfg(feature = "redis-cache")]
    #[tokio::test]
    async fn test_create_redis_store_without_url() {
        let config = StorageConfig {
            driver: StorageDriver::Redis,
            redis_url: None,
            ..StorageConfig::default()
        };

        let err = create_local_store(&config).await.unwrap_err().to_string();
        assert!(err.contains("Redis URL"));
    }
}
