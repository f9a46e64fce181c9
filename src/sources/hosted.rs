//! Hosted backend source
//!
//! `HostedSource` reads the blog tables and attaches tag memberships from the
//! join table. `MergedSource` wraps it: once the backend has answered with at
//! least one post, snapshot posts the backend does not know about yet are
//! appended, so posts imported into the snapshot but not yet migrated stay
//! visible.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::{materialize_post, DataSource, SnapshotSource, SourceError, SourceTier};
use crate::backend::HostedBackend;
use crate::models::{Dataset, SnapshotDocument};
use crate::services::resolver::{resolve, IdentityKey};

/// Hosted backend as a data source
pub struct HostedSource {
    backend: Arc<dyn HostedBackend>,
}

impl HostedSource {
    pub fn new(backend: Arc<dyn HostedBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl DataSource for HostedSource {
    fn tier(&self) -> SourceTier {
        SourceTier::Hosted
    }

    async fn load_all(&self) -> Result<Dataset, SourceError> {
        let mut posts = self.backend.list_posts().await?;
        if posts.is_empty() {
            return Err(SourceError::Empty);
        }

        let (categories, tags, links) = futures::join!(
            self.backend.list_categories(),
            self.backend.list_tags(),
            self.backend.list_post_tags()
        );
        let (categories, tags) = (categories?, tags?);

        match links {
            Ok(links) => {
                let mut by_post: HashMap<String, Vec<String>> = HashMap::new();
                for link in links {
                    by_post.entry(link.post_id).or_default().push(link.tag_id);
                }
                for post in &mut posts {
                    if let Some(tag_ids) = by_post.remove(&post.id) {
                        post.tags = tag_ids;
                    }
                }
            }
            Err(e) => tracing::warn!("Loaded posts without tag memberships: {}", e),
        }

        Ok(Dataset::new(posts, categories, tags))
    }
}

/// Append snapshot posts missing from `dataset`
///
/// Identity is checked by id, legacy id, then slug. Added posts have their
/// category and tag slugs resolved against the dataset's own taxonomy.
/// Returns how many posts were added.
pub fn merge_snapshot_posts(dataset: &mut Dataset, document: &SnapshotDocument) -> usize {
    let mut added = 0;
    for input in &document.posts {
        let candidate = materialize_post(input, &dataset.categories, &dataset.tags);
        let key = IdentityKey {
            id: input.id.as_deref(),
            legacy_id: candidate.legacy_id.as_deref(),
            slug: Some(candidate.slug.as_str()),
        };
        if resolve(key, &dataset.posts).is_match() {
            continue;
        }
        dataset.posts.push(candidate);
        added += 1;
    }
    added
}

/// Hosted data topped up from the snapshot
pub struct MergedSource {
    hosted: HostedSource,
    snapshot: Option<SnapshotSource>,
}

impl MergedSource {
    pub fn new(hosted: HostedSource, snapshot: Option<SnapshotSource>) -> Self {
        Self { hosted, snapshot }
    }

    /// Append what `fetched` holds; a failed fetch leaves `dataset` as is
    fn top_up(dataset: &mut Dataset, fetched: Result<SnapshotDocument, SourceError>) {
        match fetched {
            Ok(document) => {
                let added = merge_snapshot_posts(dataset, &document);
                if added > 0 {
                    tracing::info!("Merged {} snapshot posts missing from the hosted backend", added);
                }
            }
            Err(e) => tracing::warn!("Snapshot unavailable for merge, using hosted posts only: {}", e),
        }
    }
}

#[async_trait]
impl DataSource for MergedSource {
    fn tier(&self) -> SourceTier {
        SourceTier::Hosted
    }

    async fn load_all(&self) -> Result<Dataset, SourceError> {
        let mut dataset = self.hosted.load_all().await?;
        if let Some(ref snapshot) = self.snapshot {
            Self::top_up(&mut dataset, snapshot.fetch_document().await);
        }
        Ok(dataset)
    }

    /// The hosted load and the snapshot fetch each get `timeout`; only the
    /// hosted load can fail the source.
    async fn load_within(&self, timeout: Duration) -> Result<Dataset, SourceError> {
        let mut dataset = self.hosted.load_within(timeout).await?;
        if let Some(ref snapshot) = self.snapshot {
            let fetched = match tokio::time::timeout(timeout, snapshot.fetch_document()).await {
                Ok(result) => result,
                Err(_) => Err(SourceError::Timeout(timeout.as_secs())),
            };
            Self::top_up(&mut dataset, fetched);
        }
        Ok(dataset)
    }
}
