//! Image upload models.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Largest accepted image, in bytes (5 MiB).
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// MIME types accepted for upload.
pub const ALLOWED_IMAGE_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

/// Progress steps reported during an upload, in percent.
pub const UPLOAD_PROGRESS_STEPS: [u8; 4] = [0, 50, 80, 100];

/// Destination folder of an uploaded image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFolder {
    Hero,
    #[default]
    Gallery,
    Temp,
}

impl ImageFolder {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFolder::Hero => "hero",
            ImageFolder::Gallery => "gallery",
            ImageFolder::Temp => "temp",
        }
    }
}

impl FromStr for ImageFolder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hero" => Ok(ImageFolder::Hero),
            "gallery" => Ok(ImageFolder::Gallery),
            "temp" => Ok(ImageFolder::Temp),
            _ => Err(format!("Unknown image folder: {}", s)),
        }
    }
}

/// An image submitted for upload.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    /// Declared MIME type, if the client sent one.
    pub content_type: Option<String>,
    pub file_name: String,
    pub folder: ImageFolder,
    pub custom_name: Option<String>,
}

/// Metadata attached to a stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMetadata {
    pub uploaded_by: String,
    /// RFC 3339 timestamp.
    pub uploaded_at: String,
    pub original_name: String,
}

/// Result of a completed upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedImage {
    pub url: String,
    pub path: String,
    pub content_type: String,
    pub size: usize,
    pub progress: Vec<u8>,
}

/// Request payload for deleting an uploaded image by its public URL.
#[derive(Debug, Clone, Deserialize, validator::Validate)]
pub struct DeleteImageRequest {
    #[validate(length(min = 1, message = "URL is required"))]
    pub url: String,
}
