//! Geocoding models.

use serde::{Deserialize, Serialize};

/// A latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Which query resolved a geocoding lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeocodeSource {
    Primary,
    Fallback,
}

/// Result of a successful lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocodeResult {
    pub lat: f64,
    pub lng: f64,
    pub display_name: Option<String>,
    pub source: GeocodeSource,
}

/// Query parameters for the geocode endpoint.
#[derive(Debug, Clone, Deserialize, validator::Validate)]
pub struct GeocodeQuery {
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub address: String,
}
