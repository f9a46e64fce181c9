//! Post API endpoints
//!
//! Public:
//! - GET /api/v1/posts - Search posts
//! - GET /api/v1/posts/{slug} - Get a published post
//!
//! Admin:
//! - GET /api/v1/admin/posts - All posts, any status
//! - POST /api/v1/admin/posts - Create or update a post
//! - GET /api/v1/admin/posts/{id} - Get a post by id
//! - DELETE /api/v1/admin/posts/{id} - Delete a post

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{PostListResponse, PostResponse};
use crate::models::{PostInput, PostStatus, SearchFilters};

/// Query parameters for searching posts
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub status: Option<String>,
    /// Category id
    pub category: Option<String>,
    /// Tag id
    pub tag: Option<String>,
}

impl SearchQuery {
    fn filters(&self) -> Result<SearchFilters, ApiError> {
        let status = match self.status.as_deref() {
            Some(s) => Some(
                PostStatus::from_str(s)
                    .ok_or_else(|| ApiError::validation_error(format!("Unknown status: {}", s)))?,
            ),
            None => None,
        };

        Ok(SearchFilters {
            status,
            category: self.category.clone().filter(|c| !c.is_empty()),
            tag: self.tag.clone().filter(|t| !t.is_empty()),
        })
    }
}

/// Public post routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(search_posts))
        .route("/{slug}", get(get_post_by_slug))
}

/// Admin post routes
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_all_posts).post(save_post))
        .route("/{id}", get(get_post_by_id).delete(delete_post))
}

/// GET /api/v1/posts
async fn search_posts(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<PostListResponse>, ApiError> {
    let filters = query.filters()?;
    let posts = state.blog.search_posts(&query.q, &filters).await;
    Ok(Json(posts.into()))
}

/// GET /api/v1/posts/{slug}
async fn get_post_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PostResponse>, ApiError> {
    state
        .blog
        .get_post_by_slug(&slug)
        .await
        .map(|post| Json(post.into()))
        .ok_or_else(|| ApiError::not_found(format!("Post not found: {}", slug)))
}

/// GET /api/v1/admin/posts
async fn list_all_posts(State(state): State<AppState>) -> Json<PostListResponse> {
    Json(state.blog.get_all_posts().await.into())
}

/// GET /api/v1/admin/posts/{id}
async fn get_post_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PostResponse>, ApiError> {
    state
        .blog
        .get_post_by_id(&id)
        .await
        .map(|post| Json(post.into()))
        .ok_or_else(|| ApiError::not_found(format!("Post not found: {}", id)))
}

/// POST /api/v1/admin/posts
async fn save_post(
    State(state): State<AppState>,
    Json(input): Json<PostInput>,
) -> Result<Json<PostResponse>, ApiError> {
    let post = state.blog.save_post(input).await?;
    Ok(Json(post.into()))
}

/// DELETE /api/v1/admin/posts/{id}
async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.blog.delete_post(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
