//! Category API endpoints
//!
//! - GET /api/v1/categories - List categories
//! - GET /api/v1/categories/{slug}/posts - Published posts in a category
//! - POST /api/v1/admin/categories - Create or update a category
//! - DELETE /api/v1/admin/categories/{id} - Delete a category

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};

use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{CategoryListResponse, PostListResponse};
use crate::models::{Category, CategoryInput};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories))
        .route("/{slug}/posts", get(list_category_posts))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", post(save_category))
        .route("/{id}", delete(delete_category))
}

/// GET /api/v1/categories
async fn list_categories(State(state): State<AppState>) -> Json<CategoryListResponse> {
    Json(CategoryListResponse {
        categories: state.blog.get_categories().await,
    })
}

/// GET /api/v1/categories/{slug}/posts
async fn list_category_posts(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Json<PostListResponse> {
    Json(state.blog.get_posts_by_category(&slug).await.into())
}

/// POST /api/v1/admin/categories
async fn save_category(
    State(state): State<AppState>,
    Json(input): Json<CategoryInput>,
) -> Result<Json<Category>, ApiError> {
    Ok(Json(state.blog.save_category(input).await?))
}

/// DELETE /api/v1/admin/categories/{id}
async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.blog.delete_category(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
