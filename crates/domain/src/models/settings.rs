//! Site settings documents.
//!
//! The `settings` collection holds one document per section, keyed by the
//! section type: `doctor`, `location` and `contact`.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::str::FromStr;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use super::document::{to_document_data, Document, DocumentData};

/// Default clinic latitude used until a location is saved.
pub const DEFAULT_LATITUDE: f64 = 3.4516;

/// Default clinic longitude used until a location is saved.
pub const DEFAULT_LONGITUDE: f64 = -76.5320;

/// Settings section, also the document id in the `settings` collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingsType {
    Doctor,
    Location,
    Contact,
}

impl SettingsType {
    pub const ALL: [SettingsType; 3] = [
        SettingsType::Doctor,
        SettingsType::Location,
        SettingsType::Contact,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingsType::Doctor => "doctor",
            SettingsType::Location => "location",
            SettingsType::Contact => "contact",
        }
    }

    /// Parses and validates a raw payload for this section into document data.
    ///
    /// The returned data always carries `type` and `published`.
    pub fn parse_payload(&self, payload: JsonValue) -> Result<DocumentData, SettingsPayloadError> {
        let mut data = match self {
            SettingsType::Doctor => validated::<DoctorSettings>(payload)?,
            SettingsType::Location => validated::<LocationSettings>(payload)?,
            SettingsType::Contact => validated::<ContactSettings>(payload)?,
        };
        data.insert(
            "type".to_string(),
            JsonValue::String(self.as_str().to_string()),
        );
        Ok(data)
    }
}

impl FromStr for SettingsType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "doctor" => Ok(SettingsType::Doctor),
            "location" => Ok(SettingsType::Location),
            "contact" => Ok(SettingsType::Contact),
            _ => Err(format!("Unknown settings type: {}", s)),
        }
    }
}

impl std::fmt::Display for SettingsType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors from parsing a settings payload.
#[derive(Debug, Error)]
pub enum SettingsPayloadError {
    #[error("Malformed settings payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Invalid settings payload: {0}")]
    Invalid(#[from] ValidationErrors),
}

fn validated<T>(payload: JsonValue) -> Result<DocumentData, SettingsPayloadError>
where
    T: for<'de> Deserialize<'de> + Serialize + Validate,
{
    let settings: T = serde_json::from_value(payload)?;
    settings.validate()?;
    Ok(to_document_data(&settings)?)
}

fn default_true() -> bool {
    true
}

fn default_latitude() -> f64 {
    DEFAULT_LATITUDE
}

fn default_longitude() -> f64 {
    DEFAULT_LONGITUDE
}

/// Doctor bio section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DoctorSettings {
    #[validate(length(min = 1, max = 120, message = "Name must be 1-120 characters"))]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub name: String,

    #[serde(default)]
    #[validate(length(max = 5000, message = "Bio must be at most 5000 characters"))]
    pub bio: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(url(message = "Image URL must be a valid URL"))]
    pub image_url: Option<String>,

    #[serde(default = "default_true")]
    pub published: bool,
}

/// Clinic location section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LocationSettings {
    #[validate(length(min = 1, max = 300, message = "Address must be 1-300 characters"))]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub address: String,

    #[serde(default = "default_latitude")]
    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub latitude: f64,

    #[serde(default = "default_longitude")]
    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub longitude: f64,

    #[serde(default = "default_true")]
    pub published: bool,
}

impl TryFrom<&Document> for LocationSettings {
    type Error = serde_json::Error;

    fn try_from(document: &Document) -> Result<Self, Self::Error> {
        serde_json::from_value(JsonValue::Object(document.data.clone()))
    }
}

/// Contact channels section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ContactSettings {
    #[validate(custom(function = "shared::validation::validate_phone"))]
    pub whatsapp: String,

    #[validate(custom(function = "shared::validation::validate_phone"))]
    pub phone: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[serde(default = "default_true")]
    pub published: bool,
}

impl TryFrom<&Document> for ContactSettings {
    type Error = serde_json::Error;

    fn try_from(document: &Document) -> Result<Self, Self::Error> {
        serde_json::from_value(JsonValue::Object(document.data.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_settings_type_parse() {
        for t in SettingsType::ALL {
            assert_eq!(t.as_str().parse::<SettingsType>().unwrap(), t);
        }
        assert!("hours".parse::<SettingsType>().is_err());
    }

    #[test]
    fn test_location_payload_defaults() {
        let data = SettingsType::Location
            .parse_payload(json!({"address": "Av. 4b Nte. #58N-60, Cali"}))
            .unwrap();
        assert_eq!(data["type"], "location");
        assert_eq!(data["latitude"], DEFAULT_LATITUDE);
        assert_eq!(data["longitude"], DEFAULT_LONGITUDE);
        assert_eq!(data["published"], true);
    }

    #[test]
    fn test_location_payload_rejects_bad_coordinates() {
        let err = SettingsType::Location
            .parse_payload(json!({"address": "Cali", "latitude": 123.0}))
            .unwrap_err();
        assert!(matches!(err, SettingsPayloadError::Invalid(_)));
    }

    #[test]
    fn test_contact_payload_validates_phone_and_email() {
        let ok = SettingsType::Contact.parse_payload(json!({
            "whatsapp": "+573166817878",
            "phone": "+57 316 681 7878",
            "email": "citas@drsmile.co"
        }));
        assert!(ok.is_ok());

        let bad_phone = SettingsType::Contact.parse_payload(json!({
            "whatsapp": "+57316",
            "phone": "+573166817878",
            "email": "citas@drsmile.co"
        }));
        assert!(matches!(bad_phone, Err(SettingsPayloadError::Invalid(_))));

        let bad_email = SettingsType::Contact.parse_payload(json!({
            "whatsapp": "+573166817878",
            "phone": "+573166817878",
            "email": "not-an-email"
        }));
        assert!(matches!(bad_email, Err(SettingsPayloadError::Invalid(_))));
    }

    #[test]
    fn test_doctor_payload_missing_name_is_malformed() {
        let err = SettingsType::Doctor
            .parse_payload(json!({"bio": "Especialista"}))
            .unwrap_err();
        assert!(matches!(err, SettingsPayloadError::Malformed(_)));
    }

    #[test]
    fn test_unknown_fields_are_dropped() {
        let data = SettingsType::Doctor
            .parse_payload(json!({"name": "Dra. Pérez", "secret": "x"}))
            .unwrap();
        assert!(data.get("secret").is_none());
        assert!(data.get("imageUrl").is_none());
    }
}
