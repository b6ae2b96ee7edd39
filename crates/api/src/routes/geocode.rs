//! Address geocoding for the location settings form.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use domain::models::{GeocodeQuery, GeocodeSource};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_geocode;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(geocode_address))
}

/// Resolve an address to coordinates, retrying once with the clinic's
/// neighbourhood when the address itself finds nothing.
///
/// GET /api/v1/admin/geocode?address=...
pub async fn geocode_address(
    State(state): State<AppState>,
    query: Result<Query<GeocodeQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::Validation(e.body_text()))?;
    query.validate()?;

    match state.geocoder.geocode(&query.address).await {
        Ok(result) => {
            record_geocode(match result.source {
                GeocodeSource::Primary => "primary",
                GeocodeSource::Fallback => "fallback",
            });
            Ok(Json(result))
        }
        Err(e) => {
            record_geocode("miss");
            Err(e.into())
        }
    }
}
