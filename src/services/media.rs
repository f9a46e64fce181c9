//! Image operations of the blog service
//!
//! Images live in the hosted object store under the configured folder.

use chrono::Utc;
use uuid::Uuid;

use super::blog::{BlogError, BlogService};

/// Listing size when the caller gives none
pub const DEFAULT_IMAGE_LIST_LIMIT: usize = 80;

/// Marker object the storage service keeps in empty folders
const FOLDER_PLACEHOLDER: &str = ".emptyFolderPlaceholder";

impl BlogService {
    /// Store an image and return its public URL
    ///
    /// Objects are named `<folder>/<millis>-<6 random chars>.<ext>`.
    pub async fn upload_image(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, BlogError> {
        let Some(ref objects) = self.objects else {
            return Err(BlogError::NotConfigured("image storage requires a hosted backend".into()));
        };
        if bytes.is_empty() {
            return Err(BlogError::Validation("Image file is empty".into()));
        }

        let path = object_path(&self.image_folder, file_name, content_type);
        objects.put_object(&path, bytes, content_type).await.map_err(|e| {
            tracing::error!("Failed to upload image {}: {}", path, e);
            e
        })?;

        tracing::info!("Uploaded image {}", path);
        Ok(objects.public_url(&path))
    }

    /// Public URLs of stored images, newest name first
    ///
    /// Failures are logged and answered with an empty list.
    pub async fn list_images(&self, limit: Option<usize>) -> Vec<String> {
        let Some(ref objects) = self.objects else {
            return Vec::new();
        };
        let limit = limit.unwrap_or(DEFAULT_IMAGE_LIST_LIMIT);

        let mut names = match objects.list_objects(&self.image_folder, limit).await {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!("Failed to list images: {}", e);
                return Vec::new();
            }
        };

        names.retain(|name| !name.is_empty() && name != FOLDER_PLACEHOLDER);
        names.sort_by(|a, b| b.cmp(a));
        names.truncate(limit);
        names
            .iter()
            .map(|name| objects.public_url(&format!("{}/{}", self.image_folder, name)))
            .collect()
    }
}

fn object_path(folder: &str, file_name: &str, content_type: &str) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!(
        "{}/{}-{}.{}",
        folder,
        Utc::now().timestamp_millis(),
        &random[..6],
        extension(file_name, content_type)
    )
}

/// Extension from the file name, else from the content type, else `jpg`
fn extension(file_name: &str, content_type: &str) -> String {
    if let Some((_, ext)) = file_name.rsplit_once('.') {
        if !ext.is_empty() && ext.len() < 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return ext.to_lowercase();
        }
    }

    match content_type {
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        _ => "jpg",
    }
    .to_string()
}
