//! Snapshot export and bulk import
//!
//! Export writes the current cache as a snapshot document. Import pushes a
//! snapshot document (typically produced by the WordPress migration scripts)
//! through the normal save path.

use std::collections::{HashMap, HashSet};

use anyhow::Context;

use super::blog::{BlogError, BlogService};
use crate::models::{CategoryInput, ImportFailure, ImportStats, SnapshotDocument, TagInput};

impl BlogService {
    /// Current cache as a pretty-printed `{posts, categories, tags}` document
    pub async fn export_snapshot(&self) -> Result<String, BlogError> {
        self.ensure_loaded().await;
        let dataset = self.cache.dataset();
        let json = serde_json::to_string_pretty(&dataset).context("Failed to serialize blog data")?;
        Ok(json)
    }

    /// Import a snapshot document
    ///
    /// Missing categories and tags (by slug) are created first, then every
    /// post is saved with its slug references resolved. A document record
    /// whose id already belongs to a different slug is created under a fresh
    /// id so the existing record is left untouched. Posts whose id or
    /// legacy id already exists count as updates. Per-record failures are
    /// collected, not returned.
    pub async fn import_dataset(&self, document: SnapshotDocument) -> Result<ImportStats, BlogError> {
        self.ensure_loaded().await;
        let mut stats = ImportStats::default();

        let existing = self.cache.categories();
        let known: HashSet<&str> = existing.iter().map(|c| c.slug.as_str()).collect();
        let taken: HashSet<&str> = existing.iter().map(|c| c.id.as_str()).collect();
        for category in document.categories.iter().filter(|c| !known.contains(c.slug.as_str())) {
            let mut input = CategoryInput::new(category.name.clone()).with_slug(category.slug.clone());
            if taken.contains(category.id.as_str()) {
                tracing::warn!("Category id '{}' already in use, importing '{}' under a new id", category.id, category.slug);
            } else {
                input = input.with_id(category.id.clone());
            }
            match self.save_category(input).await {
                Ok(_) => stats.categories_created += 1,
                Err(e) => stats.errors.push(ImportFailure {
                    post: format!("category '{}'", category.slug),
                    error: e.to_string(),
                }),
            }
        }

        let existing = self.cache.tags();
        let known: HashSet<&str> = existing.iter().map(|t| t.slug.as_str()).collect();
        let taken: HashSet<&str> = existing.iter().map(|t| t.id.as_str()).collect();
        for tag in document.tags.iter().filter(|t| !known.contains(t.slug.as_str())) {
            let mut input = TagInput::new(tag.name.clone()).with_slug(tag.slug.clone());
            if taken.contains(tag.id.as_str()) {
                tracing::warn!("Tag id '{}' already in use, importing '{}' under a new id", tag.id, tag.slug);
            } else {
                input = input.with_id(tag.id.clone());
            }
            match self.save_tag(input).await {
                Ok(_) => stats.tags_created += 1,
                Err(e) => stats.errors.push(ImportFailure {
                    post: format!("tag '{}'", tag.slug),
                    error: e.to_string(),
                }),
            }
        }

        let category_ids: HashMap<String, String> = self
            .cache
            .categories()
            .into_iter()
            .map(|c| (c.slug, c.id))
            .collect();
        let tag_ids: HashMap<String, String> =
            self.cache.tags().into_iter().map(|t| (t.slug, t.id)).collect();

        for mut input in document.posts {
            if let Some(slug) = input.category_slug.take() {
                match category_ids.get(&slug) {
                    Some(id) => input.category_id = Some(Some(id.clone())),
                    None => tracing::warn!("Import references unknown category '{}'", slug),
                }
            }
            if let Some(slugs) = input.tag_slugs.take() {
                input.tags = Some(slugs.iter().filter_map(|s| tag_ids.get(s).cloned()).collect());
            }

            let existing = self.cache.find_post(|p| {
                input.id.as_deref() == Some(p.id.as_str())
                    || (input.legacy_id.is_some() && input.legacy_id == p.legacy_id)
            });
            let label = input
                .title
                .clone()
                .or_else(|| input.slug.clone())
                .unwrap_or_else(|| "(untitled)".to_string());

            match self.save_post(input).await {
                Ok(_) if existing.is_some() => stats.posts_updated += 1,
                Ok(_) => stats.posts_imported += 1,
                Err(e) => {
                    tracing::warn!("Failed to import post '{}': {}", label, e);
                    stats.errors.push(ImportFailure {
                        post: label,
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            "Import finished: {} new posts, {} updated, {} categories, {} tags, {} errors",
            stats.posts_imported,
            stats.posts_updated,
            stats.categories_created,
            stats.tags_created,
            stats.errors.len()
        );

        if self.has_backend() {
            self.reset_cache().await;
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HostedBackend;
    use crate::models::{PostInput, PostStatus};
    use crate::sources::SnapshotSource;
    use crate::test_support::{memory_cache, published_post, MockBackend};
    use std::sync::Arc;
    use std::time::Duration;

    const IMPORT: &str = r#"{
        "posts": [
            {
                "legacy_wp_id": 101,
                "legacy_wp_url": "https://old.example.com/?p=101",
                "title": "Self Assessment Deadlines",
                "content": "<p>Deadlines</p>",
                "status": "published",
                "published_at": "2023-01-10T08:00:00",
                "category_slug": "payroll",
                "tag_slugs": ["vat", "pensions"]
            },
            {
                "legacy_wp_id": "102",
                "title": "Dividend Tax",
                "status": "draft",
                "category_slug": "tax"
            },
            {
                "content": "no title"
            }
        ],
        "categories": [
            {"id": "c-payroll", "name": "Payroll", "slug": "payroll"},
            {"id": "c-tax-dup", "name": "Tax", "slug": "tax"}
        ],
        "tags": [{"id": "t-pensions", "name": "Pensions", "slug": "pensions"}]
    }"#;

    #[tokio::test]
    async fn test_import_creates_taxonomy_and_posts() {
        let service = BlogService::new(memory_cache().await, None, None, Duration::from_secs(5));
        let document: SnapshotDocument = serde_json::from_str(IMPORT).unwrap();

        let stats = service.import_dataset(document).await.unwrap();
        assert_eq!(stats.categories_created, 1);
        assert_eq!(stats.tags_created, 1);
        assert_eq!(stats.posts_imported, 2);
        assert_eq!(stats.posts_updated, 0);
        assert_eq!(stats.errors.len(), 1);
        assert_eq!(stats.errors[0].post, "(untitled)");

        let post = service.get_post_by_slug("self-assessment-deadlines").await.unwrap();
        assert_eq!(post.legacy_id.as_deref(), Some("101"));
        assert_eq!(post.legacy_url.as_deref(), Some("https://old.example.com/?p=101"));
        assert_eq!(post.category_id.as_deref(), Some("c-payroll"));
        assert_eq!(post.tags, vec!["vat".to_string(), "t-pensions".to_string()]);

        let draft = service
            .search_posts("dividend", &crate::models::SearchFilters {
                status: Some(PostStatus::Draft),
                ..Default::default()
            })
            .await;
        assert_eq!(draft[0].category_id.as_deref(), Some("tax"));
    }

    #[tokio::test]
    async fn test_reimport_counts_updates() {
        let service = BlogService::new(memory_cache().await, None, None, Duration::from_secs(5));

        service
            .import_dataset(serde_json::from_str(IMPORT).unwrap())
            .await
            .unwrap();
        let stats = service
            .import_dataset(serde_json::from_str(IMPORT).unwrap())
            .await
            .unwrap();

        assert_eq!(stats.posts_imported, 0);
        assert_eq!(stats.posts_updated, 2);
        assert_eq!(stats.categories_created, 0);
        assert_eq!(service.get_all_posts().await.len(), 2);
    }

    #[tokio::test]
    async fn test_import_never_renames_existing_taxonomy() {
        let service = BlogService::new(memory_cache().await, None, None, Duration::from_secs(5));
        let document: SnapshotDocument = serde_json::from_str(
            r#"{
                "posts": [{"title": "Capital Gains", "status": "published", "category_slug": "taxation", "tag_slugs": ["hmrc"]}],
                "categories": [{"id": "tax", "name": "Taxation", "slug": "taxation"}],
                "tags": [{"id": "vat", "name": "HMRC", "slug": "hmrc"}]
            }"#,
        )
        .unwrap();

        let stats = service.import_dataset(document).await.unwrap();
        assert_eq!(stats.categories_created, 1);
        assert_eq!(stats.tags_created, 1);
        assert!(stats.errors.is_empty());

        let categories = service.get_categories().await;
        let tax = categories.iter().find(|c| c.id == "tax").unwrap();
        assert_eq!((tax.name.as_str(), tax.slug.as_str()), ("Tax", "tax"));
        let taxation = categories.iter().find(|c| c.slug == "taxation").unwrap();
        assert_ne!(taxation.id, "tax");

        let tags = service.get_tags().await;
        assert_eq!(tags.iter().find(|t| t.id == "vat").unwrap().slug, "vat");
        let hmrc = tags.iter().find(|t| t.slug == "hmrc").unwrap();
        assert_ne!(hmrc.id, "vat");

        let post = service.get_post_by_slug("capital-gains").await.unwrap();
        assert_eq!(post.category_id.as_deref(), Some(taxation.id.as_str()));
        assert_eq!(post.tags, vec![hmrc.id.clone()]);
    }

    #[tokio::test]
    async fn test_import_with_backend_resets_cache() {
        let backend = MockBackend::with_data(vec![published_post("h1", "existing", 1)], vec![], vec![]);
        let hosted: Arc<dyn HostedBackend> = backend.clone();
        let service = BlogService::new(memory_cache().await, Some(hosted), None, Duration::from_secs(5));

        let document = SnapshotDocument {
            posts: vec![PostInput::new("Imported").with_status(PostStatus::Published)],
            ..SnapshotDocument::default()
        };
        let stats = service.import_dataset(document).await.unwrap();
        assert_eq!(stats.posts_imported, 1);
        assert_eq!(backend.post_list_calls(), 1);

        assert_eq!(service.get_all_posts().await.len(), 2);
        assert_eq!(backend.post_list_calls(), 2);
    }

    #[tokio::test]
    async fn test_export_is_a_loadable_snapshot() {
        let service = BlogService::new(memory_cache().await, None, None, Duration::from_secs(5));
        service
            .save_post(PostInput::new("Exported").with_status(PostStatus::Published))
            .await
            .unwrap();

        let json = service.export_snapshot().await.unwrap();
        assert!(json.contains("\n  \"posts\""));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");
        std::fs::write(&path, &json).unwrap();

        let snapshot = SnapshotSource::new(path.display().to_string(), Duration::from_secs(5)).unwrap();
        let reloaded = BlogService::new(memory_cache().await, None, Some(snapshot), Duration::from_secs(5));
        let posts = reloaded.get_published_posts().await;
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].slug, "exported");
        assert_eq!(reloaded.get_categories().await.len(), 5);
    }
}
