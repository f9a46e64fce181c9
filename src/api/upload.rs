//! Image API endpoints
//!
//! - GET /api/v1/admin/images?limit= - List stored images
//! - POST /api/v1/admin/images - Upload an image (multipart field `file`)

use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{ImageListResponse, UploadResponse};

/// Largest accepted upload
const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Deserialize)]
pub struct ListImagesQuery {
    pub limit: Option<usize>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_images).post(upload_image))
        .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES))
}

/// GET /api/v1/admin/images
async fn list_images(
    State(state): State<AppState>,
    Query(query): Query<ListImagesQuery>,
) -> Json<ImageListResponse> {
    Json(ImageListResponse {
        images: state.blog.list_images(query.limit).await,
    })
}

/// POST /api/v1/admin/images
async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation_error(format!("Failed to read multipart: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("image").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();

        if !content_type.starts_with("image/") && content_type != "application/octet-stream" {
            return Err(ApiError::validation_error(format!(
                "Invalid file type: {}",
                content_type
            )));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation_error(format!("Failed to read file: {}", e)))?;

        let url = state
            .blog
            .upload_image(&file_name, data.to_vec(), &content_type)
            .await?;
        return Ok(Json(UploadResponse { url }));
    }

    Err(ApiError::validation_error("No file provided"))
}
