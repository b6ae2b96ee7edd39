//! Clinic service domain model.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::document::Document;

/// Entrance animation played by the service card on the public site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceAnimation {
    #[default]
    Bounce,
    Pulse,
    Float,
    Spin,
    Shake,
    Scale,
}

/// A service offered by the clinic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_emoji")]
    pub emoji: String,
    #[serde(default)]
    pub animation: ServiceAnimation,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub published: bool,
}

impl TryFrom<&Document> for Service {
    type Error = serde_json::Error;

    fn try_from(document: &Document) -> Result<Self, Self::Error> {
        serde_json::from_value(document.to_json())
    }
}

/// Boolean service fields that can be toggled on their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceFlag {
    Active,
    Published,
}

impl ServiceFlag {
    pub fn field_name(&self) -> &'static str {
        match self {
            ServiceFlag::Active => "active",
            ServiceFlag::Published => "published",
        }
    }
}

fn default_emoji() -> String {
    "🦷".to_string()
}

fn default_true() -> bool {
    true
}

/// Request payload for creating a service.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceRequest {
    #[validate(length(min = 1, max = 120, message = "Title must be 1-120 characters"))]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub title: String,

    #[validate(length(min = 1, max = 2000, message = "Description must be 1-2000 characters"))]
    pub description: String,

    #[serde(default = "default_emoji")]
    #[validate(length(min = 1, max = 16, message = "Emoji must be 1-16 characters"))]
    pub emoji: String,

    #[serde(default)]
    pub animation: ServiceAnimation,

    #[serde(default = "default_true")]
    pub active: bool,

    #[serde(default = "default_true")]
    pub published: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0, message = "Order must be non-negative"))]
    pub order: Option<i64>,
}

/// Request payload for updating a service (partial update).
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServiceRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 120, message = "Title must be 1-120 characters"))]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 2000, message = "Description must be 1-2000 characters"))]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 16, message = "Emoji must be 1-16 characters"))]
    pub emoji: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub animation: Option<ServiceAnimation>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0, message = "Order must be non-negative"))]
    pub order: Option<i64>,
}

/// Request payload for toggling a single flag.
#[derive(Debug, Clone, Deserialize)]
pub struct ToggleServiceRequest {
    pub field: ServiceFlag,
}
