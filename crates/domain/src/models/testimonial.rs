//! Patient testimonial domain model.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::document::Document;

/// A patient testimonial shown on the public site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_rating")]
    pub rating: i32,
    #[serde(default)]
    pub order: Option<i64>,
    #[serde(default)]
    pub published: bool,
}

impl TryFrom<&Document> for Testimonial {
    type Error = serde_json::Error;

    fn try_from(document: &Document) -> Result<Self, Self::Error> {
        serde_json::from_value(document.to_json())
    }
}

fn default_rating() -> i32 {
    5
}

/// Request payload for creating a testimonial.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTestimonialRequest {
    #[validate(length(min = 1, max = 100, message = "Author name must be 1-100 characters"))]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub author_name: String,

    #[validate(length(min = 1, max = 2000, message = "Text must be 1-2000 characters"))]
    pub text: String,

    #[serde(default = "default_rating")]
    #[validate(custom(function = "shared::validation::validate_rating"))]
    pub rating: i32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,

    #[serde(default)]
    pub published: bool,
}

/// Request payload for updating a testimonial (partial update).
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTestimonialRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 100, message = "Author name must be 1-100 characters"))]
    pub author_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 2000, message = "Text must be 1-2000 characters"))]
    pub text: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "shared::validation::validate_rating"))]
    pub rating: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::faker::name::en::Name;
    use fake::Fake;
    use serde_json::json;

    #[test]
    fn test_rating_defaults_to_five() {
        let author: String = Name().fake();
        let req: CreateTestimonialRequest = serde_json::from_value(json!({
            "authorName": author,
            "text": "Excelente atención"
        }))
        .unwrap();
        assert_eq!(req.rating, 5);
        assert!(!req.published);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_rating_out_of_range_rejected() {
        for rating in [0, 6, -1] {
            let req = CreateTestimonialRequest {
                author_name: Name().fake(),
                text: "Muy bien".to_string(),
                rating,
                order: None,
                published: true,
            };
            assert!(req.validate().is_err(), "rating {} should fail", rating);
        }
    }

    #[test]
    fn test_update_rating_validated_when_present() {
        let ok = UpdateTestimonialRequest::default();
        assert!(ok.validate().is_ok());

        let bad = UpdateTestimonialRequest {
            rating: Some(9),
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
