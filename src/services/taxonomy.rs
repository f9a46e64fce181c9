//! Category and tag operations of the blog service
//!
//! Categories and tags are flat, independent namespaces with the same shape,
//! so both go through one upsert path keyed by id.

use super::blog::{replace_by_id, BlogError, BlogService, Undo};
use crate::models::{Category, CategoryInput, EntityKind, Post, Tag, TagInput};
use crate::services::identity::{ensure_unique_slug, generate_id, generate_slug, Sluggable};

/// Shared shape of categories and tags
trait Taxon: Sluggable + Clone {
    const LABEL: &'static str;

    fn create(id: String, name: String, slug: String) -> Self;
    fn set_name(&mut self, name: String);
    fn set_slug(&mut self, slug: String);
}

impl Taxon for Category {
    const LABEL: &'static str = "category";

    fn create(id: String, name: String, slug: String) -> Self {
        Category::new(id, name, slug)
    }
    fn set_name(&mut self, name: String) {
        self.name = name;
    }
    fn set_slug(&mut self, slug: String) {
        self.slug = slug;
    }
}

impl Taxon for Tag {
    const LABEL: &'static str = "tag";

    fn create(id: String, name: String, slug: String) -> Self {
        Tag::new(id, name, slug)
    }
    fn set_name(&mut self, name: String) {
        self.name = name;
    }
    fn set_slug(&mut self, slug: String) {
        self.slug = slug;
    }
}

/// Apply an upsert to `records`
///
/// An `id` that is not present creates a record carrying that id.
fn upsert_taxon<T: Taxon>(
    records: &mut Vec<T>,
    id: Option<&str>,
    name: Option<&str>,
    slug: Option<&str>,
) -> Result<(T, Undo<T>), BlogError> {
    let id = id.map(str::trim).filter(|id| !id.is_empty());
    let name = name.map(str::trim).filter(|n| !n.is_empty());
    let requested_slug = slug.map(generate_slug).filter(|s| !s.is_empty());

    if let Some(i) = id.and_then(|id| records.iter().position(|r| r.record_id() == id)) {
        let previous = records[i].clone();
        let mut record = previous.clone();
        if let Some(name) = name {
            record.set_name(name.to_string());
        }
        if let Some(desired) = requested_slug {
            if desired != previous.record_slug() {
                let unique = ensure_unique_slug(&desired, records, Some(previous.record_id()));
                record.set_slug(unique);
            }
        }
        records[i] = record.clone();
        return Ok((record, Undo::Restore(previous)));
    }

    let Some(name) = name else {
        return Err(BlogError::Validation(format!("{} name is required", T::LABEL)));
    };
    let desired = requested_slug.unwrap_or_else(|| generate_slug(name));
    if desired.is_empty() {
        return Err(BlogError::Validation(format!(
            "{} name must contain letters or digits",
            T::LABEL
        )));
    }

    let slug = ensure_unique_slug(&desired, records, None);
    let record = T::create(
        id.map(str::to_string).unwrap_or_else(generate_id),
        name.to_string(),
        slug,
    );
    records.push(record.clone());
    Ok((record.clone(), Undo::Remove(record.record_id().to_string())))
}

impl BlogService {
    // ========================================================================
    // Reads
    // ========================================================================

    pub async fn get_categories(&self) -> Vec<Category> {
        self.ensure_loaded().await;
        self.cache.categories()
    }

    pub async fn get_tags(&self) -> Vec<Tag> {
        self.ensure_loaded().await;
        self.cache.tags()
    }

    /// Published posts in the category with `slug`; empty when unknown
    pub async fn get_posts_by_category(&self, slug: &str) -> Vec<Post> {
        let Some(category) = self.get_categories().await.into_iter().find(|c| c.slug == slug) else {
            return Vec::new();
        };

        let mut posts = self.get_published_posts().await;
        posts.retain(|p| p.category_id.as_deref() == Some(category.id.as_str()));
        posts
    }

    /// Published posts carrying the tag with `slug`; empty when unknown
    pub async fn get_posts_by_tag(&self, slug: &str) -> Vec<Post> {
        let Some(tag) = self.get_tags().await.into_iter().find(|t| t.slug == slug) else {
            return Vec::new();
        };

        let mut posts = self.get_published_posts().await;
        posts.retain(|p| p.tags.contains(&tag.id));
        posts
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Create or update a category
    pub async fn save_category(&self, input: CategoryInput) -> Result<Category, BlogError> {
        self.ensure_loaded().await;

        let (saved, undo) = self.cache.patch_categories(|categories| {
            upsert_taxon(
                categories,
                input.id.as_deref(),
                input.name.as_deref(),
                input.slug.as_deref(),
            )
        })?;

        let Some(ref backend) = self.backend else {
            self.cache.persist(EntityKind::Categories).await;
            return Ok(saved);
        };

        match backend.upsert_category(&saved).await {
            Ok(stored) => {
                self.cache
                    .patch_categories(|categories| replace_by_id(categories, &saved.id, stored.clone()));
                self.cache.persist(EntityKind::Categories).await;
                Ok(stored)
            }
            Err(e) => {
                tracing::error!("Failed to save category {} to hosted backend: {}", saved.id, e);
                self.cache.patch_categories(|categories| undo.apply(categories));
                Err(e.into())
            }
        }
    }

    /// Create or update a tag
    pub async fn save_tag(&self, input: TagInput) -> Result<Tag, BlogError> {
        self.ensure_loaded().await;

        let (saved, undo) = self.cache.patch_tags(|tags| {
            upsert_taxon(tags, input.id.as_deref(), input.name.as_deref(), input.slug.as_deref())
        })?;

        let Some(ref backend) = self.backend else {
            self.cache.persist(EntityKind::Tags).await;
            return Ok(saved);
        };

        match backend.upsert_tag(&saved).await {
            Ok(stored) => {
                self.cache
                    .patch_tags(|tags| replace_by_id(tags, &saved.id, stored.clone()));
                self.cache.persist(EntityKind::Tags).await;
                Ok(stored)
            }
            Err(e) => {
                tracing::error!("Failed to save tag {} to hosted backend: {}", saved.id, e);
                self.cache.patch_tags(|tags| undo.apply(tags));
                Err(e.into())
            }
        }
    }

    /// Delete a category; posts keep their now-dangling reference
    pub async fn delete_category(&self, id: &str) -> Result<(), BlogError> {
        self.ensure_loaded().await;

        let removed = self.cache.patch_categories(|categories| take_by_id(categories, id));
        let Some((index, previous)) = removed else {
            return Err(BlogError::NotFound(format!("category {}", id)));
        };

        if let Some(ref backend) = self.backend {
            if let Err(e) = backend.delete_category(id).await {
                tracing::error!("Failed to delete category {} from hosted backend: {}", id, e);
                self.cache
                    .patch_categories(|categories| Undo::Reinsert(index, previous).apply(categories));
                return Err(e.into());
            }
        }

        self.cache.persist(EntityKind::Categories).await;
        Ok(())
    }

    /// Delete a tag; posts keep their now-dangling reference
    pub async fn delete_tag(&self, id: &str) -> Result<(), BlogError> {
        self.ensure_loaded().await;

        let removed = self.cache.patch_tags(|tags| take_by_id(tags, id));
        let Some((index, previous)) = removed else {
            return Err(BlogError::NotFound(format!("tag {}", id)));
        };

        if let Some(ref backend) = self.backend {
            if let Err(e) = backend.delete_tag(id).await {
                tracing::error!("Failed to delete tag {} from hosted backend: {}", id, e);
                self.cache.patch_tags(|tags| Undo::Reinsert(index, previous).apply(tags));
                return Err(e.into());
            }
        }

        self.cache.persist(EntityKind::Tags).await;
        Ok(())
    }
}

/// Remove the record with `id`, returning its position and value
fn take_by_id<T: Sluggable>(records: &mut Vec<T>, id: &str) -> Option<(usize, T)> {
    records
        .iter()
        .position(|r| r.record_id() == id)
        .map(|i| (i, records.remove(i)))
}
