//! Address geocoding with a single fallback query.
//!
//! The primary query is the free-text address. When it yields nothing or
//! the request fails, exactly one broader fallback query is issued. There
//! is no retry, backoff or rate limiting.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::models::{GeoPoint, GeocodeResult, GeocodeSource};

/// Errors from a geocoding lookup.
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("Address is required")]
    EmptyAddress,

    #[error("No location found for address: {0}")]
    NotFound(String),

    #[error("Geocoding request failed: {0}")]
    Request(String),

    #[error("Geocoding response could not be parsed: {0}")]
    InvalidResponse(String),
}

/// First match returned by a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeMatch {
    pub point: GeoPoint,
    pub display_name: Option<String>,
}

/// A public address lookup service.
#[async_trait]
pub trait GeocodingProvider: Send + Sync {
    /// Resolves a free-text query to its first match, if any.
    async fn search(&self, query: &str) -> Result<Option<GeocodeMatch>, GeocodeError>;
}

/// Geocoder applying the fallback policy over a provider.
#[derive(Clone)]
pub struct Geocoder {
    provider: Arc<dyn GeocodingProvider>,
    fallback_query: String,
}

impl Geocoder {
    pub fn new(provider: Arc<dyn GeocodingProvider>, fallback_query: impl Into<String>) -> Self {
        Self {
            provider,
            fallback_query: fallback_query.into(),
        }
    }

    pub async fn geocode(&self, address: &str) -> Result<GeocodeResult, GeocodeError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(GeocodeError::EmptyAddress);
        }

        match self.provider.search(address).await {
            Ok(Some(found)) => return Ok(to_result(found, GeocodeSource::Primary)),
            Ok(None) => {
                tracing::info!(address = %address, "No geocoding result, trying fallback");
            }
            Err(e) => {
                tracing::warn!(address = %address, error = %e, "Geocoding failed, trying fallback");
            }
        }

        match self.provider.search(&self.fallback_query).await? {
            Some(found) => Ok(to_result(found, GeocodeSource::Fallback)),
            None => Err(GeocodeError::NotFound(address.to_string())),
        }
    }
}

fn to_result(found: GeocodeMatch, source: GeocodeSource) -> GeocodeResult {
    GeocodeResult {
        lat: found.point.lat,
        lng: found.point.lng,
        display_name: found.display_name,
        source,
    }
}
