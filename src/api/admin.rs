//! Admin API endpoints
//!
//! - POST /api/v1/admin/cache/reset - Drop the cache and reload from the sources
//! - GET /api/v1/admin/export - Download the current data as a snapshot document
//! - POST /api/v1/admin/import - Bulk import a snapshot document

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::ReloadResponse;
use crate::models::{ImportStats, SnapshotDocument};
use crate::services::LoadOutcome;

/// File name offered for snapshot downloads
const EXPORT_FILE_NAME: &str = "blog-posts.json";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cache/reset", post(reset_cache))
        .route("/export", get(export_snapshot))
        .route("/import", post(import_snapshot))
}

/// POST /api/v1/admin/cache/reset
async fn reset_cache(State(state): State<AppState>) -> Json<ReloadResponse> {
    state.blog.reset_cache().await;

    let loaded_from = match state.blog.ensure_loaded().await {
        LoadOutcome::Source(tier) => tier.as_str().to_string(),
        LoadOutcome::Defaults => "defaults".to_string(),
    };
    Json(ReloadResponse {
        loaded_from,
        posts: state.blog.get_all_posts().await.len(),
    })
}

/// GET /api/v1/admin/export
async fn export_snapshot(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let json = state.blog.export_snapshot().await?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME),
            ),
        ],
        json,
    ))
}

/// POST /api/v1/admin/import
async fn import_snapshot(
    State(state): State<AppState>,
    Json(document): Json<SnapshotDocument>,
) -> Result<Json<ImportStats>, ApiError> {
    tracing::info!(
        "Importing {} posts, {} categories, {} tags",
        document.posts.len(),
        document.categories.len(),
        document.tags.len()
    );
    Ok(Json(state.blog.import_dataset(document).await?))
}
