//! Gallery image domain model.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::document::Document;

/// An image in the public slideshow / gallery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryImage {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub order: Option<i64>,
    #[serde(default)]
    pub published: bool,
}

impl TryFrom<&Document> for GalleryImage {
    type Error = serde_json::Error;

    fn try_from(document: &Document) -> Result<Self, Self::Error> {
        serde_json::from_value(document.to_json())
    }
}

/// Request payload for adding a gallery image.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateGalleryImageRequest {
    #[validate(url(message = "Image URL must be a valid URL"))]
    pub image_url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 300, message = "Caption must be at most 300 characters"))]
    pub caption: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,

    #[serde(default)]
    pub published: bool,
}

/// Request payload for updating a gallery image (partial update).
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGalleryImageRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(url(message = "Image URL must be a valid URL"))]
    pub image_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 300, message = "Caption must be at most 300 characters"))]
    pub caption: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
}
