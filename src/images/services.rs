use std::sync::Arc;

use anyhow::Context;
use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    images::dto::UploadResponse,
    storage::StorageClient,
};

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// A file part pulled out of a multipart body.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: String,
    pub body: Bytes,
}

#[derive(Clone)]
pub struct UploadService {
    storage: Arc<dyn StorageClient>,
}

impl UploadService {
    pub fn new(storage: Arc<dyn StorageClient>) -> Self {
        Self { storage }
    }

    pub async fn upload_image(&self, file: Option<UploadedFile>) -> AppResult<UploadResponse> {
        let file = file.ok_or_else(|| AppError::bad_request("No file uploaded"))?;

        if file.body.len() > MAX_IMAGE_BYTES {
            warn!(size = file.body.len(), "image too large");
            return Err(AppError::bad_request("Image must not exceed 5 MB"));
        }
        let ext = ext_from_mime(&file.content_type).ok_or_else(|| {
            warn!(content_type = %file.content_type, "rejected image type");
            AppError::bad_request("Only image files are allowed!")
        })?;

        let key = format!("images/{}.{}", Uuid::new_v4(), ext);
        let size = file.body.len();
        self.storage
            .put_object(&key, file.body, &file.content_type)
            .await
            .with_context(|| format!("put_object {}", key))?;

        info!(%key, size, file_name = ?file.file_name, "image stored");
        Ok(UploadResponse {
            url: self.storage.object_url(&key),
            message: "Image uploaded successfully".into(),
        })
    }
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}
