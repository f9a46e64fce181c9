//! Source reconciliation
//!
//! Decides, once per process (or per reset), which source the in-memory
//! cache is filled from:
//! 1. the hosted backend, topped up with unknown snapshot posts
//! 2. the static snapshot
//! 3. the local store
//! 4. nothing: empty posts with the default categories and tags
//!
//! Concurrent callers queue on one lock and observe the finished load, so
//! the sources are hit once no matter how many requests arrive at startup.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::backend::HostedBackend;
use crate::cache::{DataCache, LocalStore};
use crate::models::Dataset;
use crate::sources::{DataSource, HostedSource, LocalSource, MergedSource, SnapshotSource, SourceError, SourceTier};

/// Where the current cache contents came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A source produced the data set
    Source(SourceTier),
    /// Every source failed or was empty; defaults were seeded
    Defaults,
}

/// Build the ordered fallback pipeline from whatever is configured
pub fn build_pipeline(
    backend: Option<Arc<dyn HostedBackend>>,
    snapshot: Option<SnapshotSource>,
    store: Arc<LocalStore>,
) -> Vec<Box<dyn DataSource>> {
    let mut sources: Vec<Box<dyn DataSource>> = Vec::new();
    if let Some(backend) = backend {
        sources.push(Box::new(MergedSource::new(
            HostedSource::new(backend),
            snapshot.clone(),
        )));
    }
    if let Some(snapshot) = snapshot {
        sources.push(Box::new(snapshot));
    }
    sources.push(Box::new(LocalSource::new(store)));
    sources
}

/// Memoized loader for the data cache
pub struct Reconciler {
    cache: Arc<DataCache>,
    sources: Vec<Box<dyn DataSource>>,
    timeout: Duration,
    state: Mutex<Option<LoadOutcome>>,
}

impl Reconciler {
    pub fn new(cache: Arc<DataCache>, sources: Vec<Box<dyn DataSource>>, timeout: Duration) -> Self {
        Self {
            cache,
            sources,
            timeout,
            state: Mutex::new(None),
        }
    }

    /// Load the cache unless a previous load already did
    pub async fn ensure_loaded(&self) -> LoadOutcome {
        let mut state = self.state.lock().await;
        if let Some(outcome) = *state {
            return outcome;
        }

        let outcome = self.load().await;
        *state = Some(outcome);
        outcome
    }

    /// Forget the previous load; the next `ensure_loaded` runs the full sequence
    pub async fn reset(&self) {
        *self.state.lock().await = None;
        tracing::info!("Blog data cache reset");
    }

    /// Outcome of the completed load, if any
    pub async fn outcome(&self) -> Option<LoadOutcome> {
        *self.state.lock().await
    }

    async fn load(&self) -> LoadOutcome {
        let mut winner = None;
        for source in &self.sources {
            let tier = source.tier();
            match source.load_within(self.timeout).await {
                Ok(dataset) => {
                    winner = Some((tier, dataset));
                    break;
                }
                Err(SourceError::Empty) => tracing::debug!("{} source has no data", tier),
                Err(e) => tracing::warn!("{} source unavailable: {}", tier, e),
            }
        }

        let (outcome, mut dataset) = match winner {
            Some((tier, dataset)) => (LoadOutcome::Source(tier), dataset),
            None => (LoadOutcome::Defaults, Dataset::default()),
        };

        let seeded = dataset.seed_default_taxonomy();
        tracing::info!(
            "Blog data loaded from {:?}: {} posts, {} categories, {} tags",
            outcome,
            dataset.posts.len(),
            dataset.categories.len(),
            dataset.tags.len()
        );
        self.cache.replace(dataset);

        match outcome {
            LoadOutcome::Source(SourceTier::Local) if !seeded => {}
            LoadOutcome::Source(tier) => {
                self.cache.persist_all().await;
                if tier != SourceTier::Local {
                    self.cache
                        .set_loaded_from_snapshot(tier == SourceTier::Snapshot)
                        .await;
                }
            }
            LoadOutcome::Defaults => self.cache.persist_all().await,
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryStore, StoreLayer, POSTS_KEY};
    use crate::models::{Category, Tag};
    use crate::test_support::{memory_cache, published_post, MockBackend};

    fn snapshot_file(dir: &tempfile::TempDir, posts: usize) -> SnapshotSource {
        let posts: Vec<serde_json::Value> = (0..posts)
            .map(|i| serde_json::json!({"id": format!("s{}", i), "title": format!("Snapshot {}", i), "status": "published"}))
            .collect();
        let document = serde_json::json!({
            "posts": posts,
            "categories": [{"id": "cat-1", "name": "Payroll", "slug": "payroll"}],
            "tags": [{"id": "tag-1", "name": "Pensions", "slug": "pensions"}]
        });
        let path = dir.path().join("blog-posts.json");
        std::fs::write(&path, document.to_string()).unwrap();
        SnapshotSource::new(path.display().to_string(), Duration::from_secs(5)).unwrap()
    }

    fn reconciler(
        cache: &Arc<DataCache>,
        backend: Option<Arc<MockBackend>>,
        snapshot: Option<SnapshotSource>,
        timeout: Duration,
    ) -> Reconciler {
        let backend = backend.map(|b| b as Arc<dyn HostedBackend>);
        let sources = build_pipeline(backend, snapshot, cache.store().clone());
        Reconciler::new(cache.clone(), sources, timeout)
    }

    #[tokio::test]
    async fn test_nothing_configured_seeds_defaults() {
        let cache = memory_cache().await;
        let reconciler = reconciler(&cache, None, None, Duration::from_secs(5));

        assert_eq!(reconciler.ensure_loaded().await, LoadOutcome::Defaults);
        assert!(cache.posts().is_empty());
        assert_eq!(cache.categories(), Category::defaults());
        assert_eq!(cache.tags(), Tag::defaults());
    }

    #[tokio::test]
    async fn test_unreachable_backend_falls_back_to_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let cache = memory_cache().await;
        let reconciler = reconciler(
            &cache,
            Some(MockBackend::unreachable()),
            Some(snapshot_file(&dir, 3)),
            Duration::from_secs(5),
        );

        let outcome = reconciler.ensure_loaded().await;
        assert_eq!(outcome, LoadOutcome::Source(SourceTier::Snapshot));
        assert_eq!(cache.posts().len(), 3);
        assert_eq!(cache.categories()[0].slug, "payroll");
        assert_eq!(cache.tags()[0].slug, "pensions");
        assert!(cache.loaded_from_snapshot().await);
    }

    #[tokio::test]
    async fn test_hosted_and_snapshot_are_merged() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = snapshot_file(&dir, 3);
        let backend = MockBackend::with_data(
            vec![published_post("s0", "overlap", 1), published_post("h1", "hosted-only", 2)],
            Category::defaults(),
            Tag::defaults(),
        );
        let cache = memory_cache().await;
        let reconciler = reconciler(&cache, Some(backend), Some(snapshot), Duration::from_secs(5));

        assert_eq!(reconciler.ensure_loaded().await, LoadOutcome::Source(SourceTier::Hosted));
        assert_eq!(cache.posts().len(), 4);
        assert_eq!(cache.categories(), Category::defaults());
        assert!(!cache.loaded_from_snapshot().await);
    }

    #[tokio::test]
    async fn test_concurrent_callers_trigger_one_fetch() {
        let backend = MockBackend::with_data(vec![published_post("h1", "a", 1)], vec![], vec![]);
        backend.set_delay(Duration::from_millis(50));
        let cache = memory_cache().await;
        let reconciler = Arc::new(reconciler(&cache, Some(backend.clone()), None, Duration::from_secs(5)));

        let calls = (0..8).map(|_| {
            let reconciler = reconciler.clone();
            tokio::spawn(async move { reconciler.ensure_loaded().await })
        });
        for outcome in futures::future::join_all(calls).await {
            assert_eq!(outcome.unwrap(), LoadOutcome::Source(SourceTier::Hosted));
        }

        assert_eq!(backend.post_list_calls(), 1);
    }

    #[tokio::test]
    async fn test_reset_reloads() {
        let backend = MockBackend::with_data(vec![published_post("h1", "a", 1)], vec![], vec![]);
        let cache = memory_cache().await;
        let reconciler = reconciler(&cache, Some(backend.clone()), None, Duration::from_secs(5));

        reconciler.ensure_loaded().await;
        reconciler.ensure_loaded().await;
        assert_eq!(backend.post_list_calls(), 1);

        backend.posts.lock().unwrap().push(published_post("h2", "b", 2));
        reconciler.reset().await;
        assert!(reconciler.outcome().await.is_none());

        reconciler.ensure_loaded().await;
        assert_eq!(backend.post_list_calls(), 2);
        assert_eq!(cache.posts().len(), 2);
    }

    #[tokio::test]
    async fn test_slow_backend_times_out_to_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let backend = MockBackend::with_data(vec![published_post("h1", "a", 1)], vec![], vec![]);
        backend.set_delay(Duration::from_secs(3));
        let cache = memory_cache().await;
        let reconciler = reconciler(&cache, Some(backend), Some(snapshot_file(&dir, 2)), Duration::from_millis(300));

        assert_eq!(reconciler.ensure_loaded().await, LoadOutcome::Source(SourceTier::Snapshot));
        assert_eq!(cache.posts().len(), 2);
    }

    #[tokio::test]
    async fn test_slow_snapshot_keeps_hosted_posts() {
        use axum::{routing::get, Json, Router};

        let router = Router::new().route(
            "/blog-posts.json",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                Json(serde_json::json!({"posts": [{"id": "s1", "title": "Late", "status": "published"}]}))
            }),
        );
        let base = crate::test_support::serve(router).await;
        let snapshot = SnapshotSource::new(format!("{}/blog-posts.json", base), Duration::from_secs(10)).unwrap();

        let backend = MockBackend::with_data(
            vec![published_post("h1", "first", 1), published_post("h2", "second", 2)],
            vec![],
            vec![],
        );
        backend.set_delay(Duration::from_millis(100));
        let cache = memory_cache().await;
        let reconciler = reconciler(&cache, Some(backend.clone()), Some(snapshot), Duration::from_secs(1));

        assert_eq!(reconciler.ensure_loaded().await, LoadOutcome::Source(SourceTier::Hosted));
        assert_eq!(cache.posts().len(), 2);
        assert_eq!(backend.post_list_calls(), 1);
    }

    #[tokio::test]
    async fn test_local_store_is_last_resort() {
        let store = Arc::new(LocalStore::Memory(MemoryStore::new()));
        store.set(POSTS_KEY, &vec![published_post("p1", "kept", 0)]).await.unwrap();
        let cache = Arc::new(DataCache::open(store.clone()).await);

        let backend: Arc<dyn HostedBackend> = MockBackend::unreachable();
        let sources = build_pipeline(Some(backend), None, store);
        let reconciler = Reconciler::new(cache.clone(), sources, Duration::from_secs(5));

        assert_eq!(reconciler.ensure_loaded().await, LoadOutcome::Source(SourceTier::Local));
        assert_eq!(cache.posts().len(), 1);
        assert_eq!(cache.categories(), Category::defaults());

        let persisted: Option<Vec<Category>> = cache.store().get(crate::cache::CATEGORIES_KEY).await.unwrap();
        assert_eq!(persisted, Some(Category::defaults()));
    }

    #[test]
    fn test_pipeline_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LocalStore::Memory(MemoryStore::new()));
        let backend: Arc<dyn HostedBackend> = MockBackend::unreachable();

        let tiers: Vec<SourceTier> = build_pipeline(Some(backend), Some(snapshot_file(&dir, 1)), store.clone())
            .iter()
            .map(|s| s.tier())
            .collect();
        assert_eq!(tiers, vec![SourceTier::Hosted, SourceTier::Snapshot, SourceTier::Local]);

        let tiers: Vec<SourceTier> = build_pipeline(None, None, store).iter().map(|s| s.tier()).collect();
        assert_eq!(tiers, vec![SourceTier::Local]);
    }
}
