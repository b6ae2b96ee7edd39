//! Image upload pipeline.
//!
//! Validation happens before any storage call. Progress is reported in
//! coarse steps: 0 when accepted for processing, 50 once validated, 80
//! once stored, 100 once the public URL is known.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;

use crate::models::upload::{ALLOWED_IMAGE_TYPES, MAX_IMAGE_BYTES};
use crate::models::{ImageFolder, ImageUpload, ObjectMetadata, UploadedImage};

use super::content::Actor;

/// Errors from the upload pipeline.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("File too large: {size} bytes (max {max})")]
    TooLarge { size: usize, max: usize },

    #[error("Invalid file name: {0}")]
    InvalidName(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Object storage error: {0}")]
    Storage(String),
}

/// Object storage backend.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Stores an object under `key`, replacing any existing one.
    async fn put(
        &self,
        key: &str,
        bytes: &[u8],
        content_type: &str,
        metadata: &ObjectMetadata,
    ) -> Result<(), UploadError>;

    /// Removes an object, returning whether it existed.
    async fn delete(&self, key: &str) -> Result<bool, UploadError>;

    /// Public download URL of a stored object.
    fn public_url(&self, key: &str) -> String;

    /// Inverse of [`ObjectStorage::public_url`]. `None` for foreign URLs.
    fn key_for_url(&self, url: &str) -> Option<String>;
}

/// Declared MIME type, or a guess from the file name when absent or generic.
pub fn resolve_content_type(declared: Option<&str>, file_name: &str) -> String {
    match declared.map(str::trim) {
        Some(ct) if !ct.is_empty() && ct != "application/octet-stream" => ct.to_ascii_lowercase(),
        _ => mime_guess::from_path(file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string(),
    }
}

/// Checks type and size of an image before it is stored.
pub fn validate_image(content_type: &str, size: usize) -> Result<(), UploadError> {
    if !content_type.starts_with("image/") {
        return Err(UploadError::UnsupportedMediaType(content_type.to_string()));
    }
    if size > MAX_IMAGE_BYTES {
        return Err(UploadError::TooLarge {
            size,
            max: MAX_IMAGE_BYTES,
        });
    }
    if !ALLOWED_IMAGE_TYPES.contains(&content_type) {
        return Err(UploadError::UnsupportedMediaType(content_type.to_string()));
    }
    Ok(())
}

/// Replaces every character outside `[A-Za-z0-9.-]` with `_`.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// File extension written for a validated image type.
fn image_extension(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        "image/webp" => "webp",
        _ => "jpg",
    }
}

/// Makes the name's extension agree with `content_type`, so the stored
/// object is always served as the type that was validated.
fn with_image_extension(name: &str, content_type: &str) -> String {
    let matches = mime_guess::from_path(name)
        .iter()
        .any(|guess| guess.essence_str() == content_type);
    if matches {
        return name.to_string();
    }
    let stem = match name.rsplit_once('.') {
        Some((stem, _)) if !stem.trim_matches('.').is_empty() => stem,
        _ => name,
    };
    format!("{}.{}", stem, image_extension(content_type))
}

/// Storage key for an upload: `{folder}/{custom}` or `{folder}/{millis}_{sanitized}`,
/// with the extension of the validated `content_type`.
pub fn object_key(
    folder: ImageFolder,
    custom_name: Option<&str>,
    file_name: &str,
    content_type: &str,
    millis: i64,
) -> Result<String, UploadError> {
    let name = match custom_name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(custom) => sanitize_file_name(custom),
        None => format!("{}_{}", millis, sanitize_file_name(file_name)),
    };
    if name.chars().all(|c| c == '.') {
        return Err(UploadError::InvalidName(name));
    }
    Ok(format!(
        "{}/{}",
        folder.as_str(),
        with_image_extension(&name, content_type)
    ))
}

/// Validates, stores and publishes images.
#[derive(Clone)]
pub struct ImageUploader {
    storage: Arc<dyn ObjectStorage>,
}

impl ImageUploader {
    pub fn new(storage: Arc<dyn ObjectStorage>) -> Self {
        Self { storage }
    }

    /// Uploads an image, reporting each progress step to `on_progress`.
    pub async fn upload<F>(
        &self,
        upload: ImageUpload,
        actor: &Actor,
        mut on_progress: F,
    ) -> Result<UploadedImage, UploadError>
    where
        F: FnMut(u8) + Send,
    {
        let mut progress = Vec::with_capacity(4);
        let mut step = |p: u8| {
            progress.push(p);
            on_progress(p);
        };

        step(0);
        let content_type = resolve_content_type(upload.content_type.as_deref(), &upload.file_name);
        let size = upload.bytes.len();
        validate_image(&content_type, size)?;

        let now = Utc::now();
        let key = object_key(
            upload.folder,
            upload.custom_name.as_deref(),
            &upload.file_name,
            &content_type,
            now.timestamp_millis(),
        )?;
        let metadata = ObjectMetadata {
            uploaded_by: actor.uid.clone(),
            uploaded_at: now.to_rfc3339(),
            original_name: upload.file_name.clone(),
        };
        step(50);

        self.storage
            .put(&key, &upload.bytes, &content_type, &metadata)
            .await?;
        step(80);

        let url = self.storage.public_url(&key);
        step(100);

        tracing::info!(
            key = %key,
            size,
            content_type = %content_type,
            uploaded_by = %actor.uid,
            "Image uploaded"
        );

        Ok(UploadedImage {
            url,
            path: key,
            content_type,
            size,
            progress,
        })
    }

    /// Deletes a previously uploaded image by its public URL.
    pub async fn delete_by_url(&self, url: &str) -> Result<(), UploadError> {
        let key = self
            .storage
            .key_for_url(url)
            .ok_or_else(|| UploadError::NotFound(url.to_string()))?;
        if !self.storage.delete(&key).await? {
            return Err(UploadError::NotFound(key));
        }
        tracing::info!(key = %key, "Image deleted");
        Ok(())
    }
}
