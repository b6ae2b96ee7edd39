//! Nominatim (OpenStreetMap) geocoding client.
//!
//! One `search` request per lookup. No retries, backoff or client-side rate
//! limiting; the fallback policy lives in [`domain::services::Geocoder`].

use async_trait::async_trait;
use domain::models::GeoPoint;
use domain::services::{GeocodeError, GeocodeMatch, GeocodingProvider};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::GeocodingConfig;

/// Search hit as returned by Nominatim. Coordinates arrive as strings.
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: Option<String>,
}

impl NominatimPlace {
    fn into_match(self) -> Result<GeocodeMatch, GeocodeError> {
        let lat = self
            .lat
            .trim()
            .parse::<f64>()
            .map_err(|_| GeocodeError::InvalidResponse(format!("bad lat: {}", self.lat)))?;
        let lng = self
            .lon
            .trim()
            .parse::<f64>()
            .map_err(|_| GeocodeError::InvalidResponse(format!("bad lon: {}", self.lon)))?;
        Ok(GeocodeMatch {
            point: GeoPoint { lat, lng },
            display_name: self.display_name,
        })
    }
}

pub struct NominatimClient {
    client: Client,
    search_url: String,
    timeout_ms: u64,
}

impl NominatimClient {
    pub fn new(config: &GeocodingConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            search_url: format!("{}/search", config.base_url.trim_end_matches('/')),
            timeout_ms: config.timeout_ms,
        })
    }
}

#[async_trait]
impl GeocodingProvider for NominatimClient {
    async fn search(&self, query: &str) -> Result<Option<GeocodeMatch>, GeocodeError> {
        debug!(query = %query, "Calling Nominatim search");

        let response = self
            .client
            .get(&self.search_url)
            .query(&[
                ("format", "json"),
                ("addressdetails", "1"),
                ("limit", "1"),
                ("q", query),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GeocodeError::Request(format!("timeout after {}ms", self.timeout_ms))
                } else {
                    GeocodeError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Request(format!("HTTP {}", status)));
        }

        let places: Vec<NominatimPlace> = response
            .json()
            .await
            .map_err(|e| GeocodeError::InvalidResponse(e.to_string()))?;

        first_match(places)
    }
}

fn first_match(places: Vec<NominatimPlace>) -> Result<Option<GeocodeMatch>, GeocodeError> {
    places.into_iter().next().map(NominatimPlace::into_match).transpose()
}
