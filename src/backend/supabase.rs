//! Supabase adapter
//!
//! Talks to the PostgREST endpoint (`/rest/v1/<table>`) and the Storage API
//! (`/storage/v1/object/...`) with the project's anon key. Every request
//! carries both the `apikey` header and a bearer token, and the shared HTTP
//! client enforces the configured source timeout.

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use super::{
    BackendError, HostedBackend, ObjectStore, PostTagLink, CATEGORIES_TABLE, POSTS_TABLE,
    POST_TAGS_TABLE, TAGS_TABLE,
};
use crate::models::{Category, Post, Tag};

const UPSERT_PREFER: &str = "resolution=merge-duplicates,return=representation";

/// Newest first, unpublished rows last
const POSTS_ORDER: &str = "published_at.desc.nullslast";
const TAXONOMY_ORDER: &str = "name";

/// Hosted backend over Supabase REST APIs
pub struct SupabaseBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    bucket: String,
}

impl std::fmt::Debug for SupabaseBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseBackend")
            .field("base_url", &self.base_url)
            .field("bucket", &self.bucket)
            .finish_non_exhaustive()
    }
}

/// Entry returned by the storage list endpoint
#[derive(Debug, Deserialize)]
struct StorageEntry {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
struct ListObjectsRequest<'a> {
    prefix: &'a str,
    limit: usize,
    offset: usize,
    #[serde(rename = "sortBy")]
    sort_by: SortBy,
}

#[derive(Debug, Serialize)]
struct SortBy {
    column: &'static str,
    order: &'static str,
}

impl SupabaseBackend {
    /// Create an adapter for the project at `base_url`
    pub fn new(base_url: &str, api_key: &str, bucket: &str, timeout: Duration) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            bucket: bucket.to_string(),
        })
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn storage_url(&self, tail: &str) -> String {
        format!("{}/storage/v1/object/{}", self.base_url, tail)
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// Turn non-success statuses into `BackendError::Status`
    async fn check(response: Response) -> Result<Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(BackendError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn select_all<T: DeserializeOwned>(&self, table: &str, order: Option<&str>) -> Result<Vec<T>, BackendError> {
        let mut request = self
            .client
            .get(self.rest_url(table))
            .query(&[("select", "*")]);
        if let Some(order) = order {
            request = request.query(&[("order", order)]);
        }
        let response = Self::check(self.authed(request).send().await?).await?;
        Self::decode(response).await
    }

    async fn upsert_row<T: DeserializeOwned>(&self, table: &str, row: &Value) -> Result<T, BackendError> {
        let request = self
            .client
            .post(self.rest_url(table))
            .query(&[("on_conflict", "id")])
            .header("Prefer", UPSERT_PREFER)
            .json(row);
        let response = Self::check(self.authed(request).send().await?).await?;

        let mut rows: Vec<T> = Self::decode(response).await?;
        if rows.is_empty() {
            return Err(BackendError::Decode(format!("upsert into {} returned no row", table)));
        }
        Ok(rows.swap_remove(0))
    }

    async fn delete_where(&self, table: &str, column: &str, value: &str) -> Result<(), BackendError> {
        let filter = format!("eq.{}", value);
        let request = self
            .client
            .delete(self.rest_url(table))
            .query(&[(column, filter.as_str())]);
        Self::check(self.authed(request).send().await?).await?;
        Ok(())
    }

    async fn insert_rows<T: Serialize>(&self, table: &str, rows: &[T]) -> Result<(), BackendError> {
        let request = self
            .client
            .post(self.rest_url(table))
            .header("Prefer", "return=minimal")
            .json(rows);
        Self::check(self.authed(request).send().await?).await?;
        Ok(())
    }

    /// Replace a post's tag memberships: delete all, then insert the new set
    async fn replace_post_tags(&self, post_id: &str, tag_ids: &[String]) -> Result<(), BackendError> {
        self.delete_where(POST_TAGS_TABLE, "post_id", post_id).await?;
        if tag_ids.is_empty() {
            return Ok(());
        }
        let links: Vec<PostTagLink> = tag_ids
            .iter()
            .map(|tag_id| PostTagLink::new(post_id, tag_id.as_str()))
            .collect();
        self.insert_rows(POST_TAGS_TABLE, &links).await
    }
}

/// Row sent to the posts table
///
/// Tags live in the join table; legacy identifiers use the migration's
/// column names.
pub fn post_payload(post: &Post) -> Result<Value, BackendError> {
    let mut value = serde_json::to_value(post).map_err(|e| BackendError::Decode(e.to_string()))?;
    if let Some(row) = value.as_object_mut() {
        row.remove("tags");
        if let Some(legacy_id) = row.remove("legacy_id") {
            row.insert("legacy_wp_id".to_string(), legacy_id);
        }
        if let Some(legacy_url) = row.remove("legacy_url") {
            row.insert("legacy_wp_url".to_string(), legacy_url);
        }
    }
    Ok(value)
}

fn row_of<T: Serialize>(record: &T) -> Result<Value, BackendError> {
    serde_json::to_value(record).map_err(|e| BackendError::Decode(e.to_string()))
}

#[async_trait]
impl HostedBackend for SupabaseBackend {
    async fn list_posts(&self) -> Result<Vec<Post>, BackendError> {
        self.select_all(POSTS_TABLE, Some(POSTS_ORDER)).await
    }

    async fn list_categories(&self) -> Result<Vec<Category>, BackendError> {
        self.select_all(CATEGORIES_TABLE, Some(TAXONOMY_ORDER)).await
    }

    async fn list_tags(&self) -> Result<Vec<Tag>, BackendError> {
        self.select_all(TAGS_TABLE, Some(TAXONOMY_ORDER)).await
    }

    async fn list_post_tags(&self) -> Result<Vec<PostTagLink>, BackendError> {
        self.select_all(POST_TAGS_TABLE, None).await
    }

    /// Once the row is stored the save counts as done; a failed membership
    /// sync is logged and the stored row is still returned.
    async fn upsert_post(&self, post: &Post) -> Result<Post, BackendError> {
        let mut stored: Post = self.upsert_row(POSTS_TABLE, &post_payload(post)?).await?;
        if let Err(e) = self.replace_post_tags(&stored.id, &post.tags).await {
            tracing::warn!("Post {} saved but its tag memberships were not synced: {}", stored.id, e);
        }
        stored.tags = post.tags.clone();
        Ok(stored)
    }

    async fn delete_post(&self, id: &str) -> Result<(), BackendError> {
        self.delete_where(POST_TAGS_TABLE, "post_id", id).await?;
        self.delete_where(POSTS_TABLE, "id", id).await
    }

    async fn upsert_category(&self, category: &Category) -> Result<Category, BackendError> {
        self.upsert_row(CATEGORIES_TABLE, &row_of(category)?).await
    }

    async fn delete_category(&self, id: &str) -> Result<(), BackendError> {
        self.delete_where(CATEGORIES_TABLE, "id", id).await
    }

    async fn upsert_tag(&self, tag: &Tag) -> Result<Tag, BackendError> {
        self.upsert_row(TAGS_TABLE, &row_of(tag)?).await
    }

    async fn delete_tag(&self, id: &str) -> Result<(), BackendError> {
        self.delete_where(TAGS_TABLE, "id", id).await
    }
}

#[async_trait]
impl ObjectStore for SupabaseBackend {
    async fn put_object(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), BackendError> {
        let request = self
            .client
            .post(self.storage_url(&format!("{}/{}", self.bucket, encode_path(path))))
            .header("Content-Type", content_type)
            .header("x-upsert", "false")
            .body(bytes);
        Self::check(self.authed(request).send().await?).await?;
        Ok(())
    }

    async fn list_objects(&self, folder: &str, limit: usize) -> Result<Vec<String>, BackendError> {
        let body = ListObjectsRequest {
            prefix: folder,
            limit,
            offset: 0,
            sort_by: SortBy {
                column: "name",
                order: "desc",
            },
        };
        let request = self
            .client
            .post(self.storage_url(&format!("list/{}", self.bucket)))
            .json(&body);
        let response = Self::check(self.authed(request).send().await?).await?;

        let entries: Vec<StorageEntry> = Self::decode(response).await?;
        Ok(entries.into_iter().filter_map(|e| e.name).collect())
    }

    fn public_url(&self, path: &str) -> String {
        self.storage_url(&format!("public/{}/{}", self.bucket, encode_path(path)))
    }
}

/// Percent-encode each segment of an object path, keeping the separators
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
