//! Shared test fixtures: an in-memory hosted backend and a throwaway HTTP
//! server for exercising real requests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::backend::{BackendError, HostedBackend, ObjectStore, PostTagLink};
use crate::cache::{DataCache, LocalStore, MemoryStore};
use crate::models::{Category, Post, PostStatus, Tag};

/// Serve `router` on an ephemeral local port and return its base URL
pub async fn serve(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Empty cache over an in-memory store
pub async fn memory_cache() -> Arc<DataCache> {
    Arc::new(DataCache::open(Arc::new(LocalStore::Memory(MemoryStore::new()))).await)
}

/// A published post with fixed timestamps `days` after 2024-01-01
pub fn published_post(id: &str, slug: &str, days: i64) -> Post {
    let base = crate::models::serde_helpers::parse_timestamp("2024-01-01T09:00:00Z").unwrap();
    let mut post = Post::new(id.into(), slug.into(), slug.replace('-', " "));
    post.status = PostStatus::Published;
    post.created_at = base + chrono::Duration::days(days);
    post.updated_at = post.created_at;
    post.published_at = Some(post.created_at);
    post
}

/// In-memory hosted backend with call counters and failure switches
#[derive(Default)]
pub struct MockBackend {
    pub posts: Mutex<Vec<Post>>,
    pub categories: Mutex<Vec<Category>>,
    pub tags: Mutex<Vec<Tag>>,
    pub objects: Mutex<Vec<String>>,
    pub post_list_calls: AtomicUsize,
    pub write_calls: AtomicUsize,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
    pub delay_ms: AtomicU64,
}

impl MockBackend {
    pub fn with_data(posts: Vec<Post>, categories: Vec<Category>, tags: Vec<Tag>) -> Arc<Self> {
        Arc::new(Self {
            posts: Mutex::new(posts),
            categories: Mutex::new(categories),
            tags: Mutex::new(tags),
            ..Self::default()
        })
    }

    /// A backend whose every call fails
    pub fn unreachable() -> Arc<Self> {
        let backend = Self::default();
        backend.fail_reads.store(true, Ordering::SeqCst);
        backend.fail_writes.store(true, Ordering::SeqCst);
        Arc::new(backend)
    }

    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn post_list_calls(&self) -> usize {
        self.post_list_calls.load(Ordering::SeqCst)
    }

    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    fn outage() -> BackendError {
        BackendError::Status {
            status: 503,
            body: "service unavailable".into(),
        }
    }

    async fn read_gate(&self) -> Result<(), BackendError> {
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Self::outage());
        }
        Ok(())
    }

    fn write_gate(&self) -> Result<(), BackendError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::outage());
        }
        Ok(())
    }
}

fn upsert_by_id<T: Clone>(rows: &Mutex<Vec<T>>, row: &T, id_of: impl Fn(&T) -> &str) -> T {
    let mut rows = rows.lock().unwrap();
    match rows.iter().position(|r| id_of(r) == id_of(row)) {
        Some(i) => rows[i] = row.clone(),
        None => rows.push(row.clone()),
    }
    row.clone()
}

#[async_trait]
impl HostedBackend for MockBackend {
    async fn list_posts(&self) -> Result<Vec<Post>, BackendError> {
        self.post_list_calls.fetch_add(1, Ordering::SeqCst);
        self.read_gate().await?;
        let mut posts = self.posts.lock().unwrap().clone();
        // Memberships are served separately, like the real join table.
        for post in &mut posts {
            post.tags.clear();
        }
        Ok(posts)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, BackendError> {
        self.read_gate().await?;
        Ok(self.categories.lock().unwrap().clone())
    }

    async fn list_tags(&self) -> Result<Vec<Tag>, BackendError> {
        self.read_gate().await?;
        Ok(self.tags.lock().unwrap().clone())
    }

    async fn list_post_tags(&self) -> Result<Vec<PostTagLink>, BackendError> {
        self.read_gate().await?;
        let posts = self.posts.lock().unwrap();
        Ok(posts
            .iter()
            .flat_map(|p| p.tags.iter().map(|t| PostTagLink::new(p.id.as_str(), t.as_str())))
            .collect())
    }

    async fn upsert_post(&self, post: &Post) -> Result<Post, BackendError> {
        self.write_gate()?;
        Ok(upsert_by_id(&self.posts, post, |p| p.id.as_str()))
    }

    async fn delete_post(&self, id: &str) -> Result<(), BackendError> {
        self.write_gate()?;
        self.posts.lock().unwrap().retain(|p| p.id != id);
        Ok(())
    }

    async fn upsert_category(&self, category: &Category) -> Result<Category, BackendError> {
        self.write_gate()?;
        Ok(upsert_by_id(&self.categories, category, |c| c.id.as_str()))
    }

    async fn delete_category(&self, id: &str) -> Result<(), BackendError> {
        self.write_gate()?;
        self.categories.lock().unwrap().retain(|c| c.id != id);
        Ok(())
    }

    async fn upsert_tag(&self, tag: &Tag) -> Result<Tag, BackendError> {
        self.write_gate()?;
        Ok(upsert_by_id(&self.tags, tag, |t| t.id.as_str()))
    }

    async fn delete_tag(&self, id: &str) -> Result<(), BackendError> {
        self.write_gate()?;
        self.tags.lock().unwrap().retain(|t| t.id != id);
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MockBackend {
    async fn put_object(&self, path: &str, _bytes: Vec<u8>, _content_type: &str) -> Result<(), BackendError> {
        self.write_gate()?;
        self.objects.lock().unwrap().push(path.to_string());
        Ok(())
    }

    async fn list_objects(&self, folder: &str, limit: usize) -> Result<Vec<String>, BackendError> {
        self.read_gate().await?;
        let prefix = format!("{}/", folder);
        let mut names: Vec<String> = self
            .objects
            .lock()
            .unwrap()
            .iter()
            .filter_map(|p| p.strip_prefix(&prefix).map(str::to_string))
            .collect();
        names.sort_by(|a, b| b.cmp(a));
        names.truncate(limit);
        Ok(names)
    }

    fn public_url(&self, path: &str) -> String {
        format!("https://cdn.test/blog-images/{}", path)
    }
}
