//! Tag API endpoints
//!
//! - GET /api/v1/tags - List tags
//! - GET /api/v1/tags/{slug}/posts - Published posts with a tag
//! - POST /api/v1/admin/tags - Create or update a tag
//! - DELETE /api/v1/admin/tags/{id} - Delete a tag

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};

use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{PostListResponse, TagListResponse};
use crate::models::{Tag, TagInput};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tags))
        .route("/{slug}/posts", get(list_tag_posts))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", post(save_tag))
        .route("/{id}", delete(delete_tag))
}

/// GET /api/v1/tags
async fn list_tags(State(state): State<AppState>) -> Json<TagListResponse> {
    Json(TagListResponse {
        tags: state.blog.get_tags().await,
    })
}

/// GET /api/v1/tags/{slug}/posts
async fn list_tag_posts(State(state): State<AppState>, Path(slug): Path<String>) -> Json<PostListResponse> {
    Json(state.blog.get_posts_by_tag(&slug).await.into())
}

/// POST /api/v1/admin/tags
async fn save_tag(
    State(state): State<AppState>,
    Json(input): Json<TagInput>,
) -> Result<Json<Tag>, ApiError> {
    Ok(Json(state.blog.save_tag(input).await?))
}

/// DELETE /api/v1/admin/tags/{id}
async fn delete_tag(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    state.blog.delete_tag(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
