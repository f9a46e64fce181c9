//! Local store source
//!
//! Last resort: whatever the previous successful load persisted.

use async_trait::async_trait;
use std::sync::Arc;

use super::{DataSource, SourceError, SourceTier};
use crate::cache::{read_persisted, LocalStore};
use crate::models::Dataset;

pub struct LocalSource {
    store: Arc<LocalStore>,
}

impl LocalSource {
    pub fn new(store: Arc<LocalStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl DataSource for LocalSource {
    fn tier(&self) -> SourceTier {
        SourceTier::Local
    }

    async fn load_all(&self) -> Result<Dataset, SourceError> {
        let dataset = read_persisted(&self.store)
            .await
            .map_err(|e| SourceError::Fetch(format!("{:#}", e)))?;

        if dataset.is_empty() {
            return Err(SourceError::Empty);
        }
        Ok(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryStore, StoreLayer, POSTS_KEY};
    use crate::test_support::published_post;

    #[tokio::test]
    async fn test_empty_store_is_empty() {
        let source = LocalSource::new(Arc::new(LocalStore::Memory(MemoryStore::new())));
        assert!(matches!(source.load_all().await, Err(SourceError::Empty)));
    }

    #[tokio::test]
    async fn test_reads_persisted_posts() {
        let store = Arc::new(LocalStore::Memory(MemoryStore::new()));
        store.set(POSTS_KEY, &vec![published_post("p1", "kept", 0)]).await.unwrap();

        let dataset = LocalSource::new(store).load_all().await.unwrap();
        assert_eq!(dataset.posts.len(), 1);
        assert!(dataset.categories.is_empty());
    }
}
