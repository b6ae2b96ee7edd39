//! Site settings routes (doctor bio, clinic location, contact channels).
//!
//! Each section is one document in the settings collection whose id is
//! the section name.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use domain::models::{Collection, Document, SettingsType};
use serde_json::Value as JsonValue;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AdminUser;
use crate::middleware::metrics::record_content_mutation;
use crate::routes::content::document_events;

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/:type", get(get_published_settings))
        .route("/:type/watch", get(watch_settings))
}

pub fn admin_router() -> Router<AppState> {
    Router::new().route("/:type", get(get_settings).put(save_settings))
}

fn parse_type(raw: &str) -> Result<SettingsType, ApiError> {
    raw.parse::<SettingsType>().map_err(ApiError::NotFound)
}

async fn load(state: &AppState, settings_type: SettingsType) -> Result<Option<Document>, ApiError> {
    Ok(state
        .documents
        .get(Collection::Settings, settings_type.as_str())
        .await?)
}

fn not_configured(settings_type: SettingsType) -> ApiError {
    ApiError::NotFound(format!("{} settings not found", settings_type))
}

/// A settings section as the public site sees it; 404 while unpublished.
///
/// GET /api/v1/settings/:type
pub async fn get_published_settings(
    State(state): State<AppState>,
    Path(settings_type): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let settings_type = parse_type(&settings_type)?;
    match load(&state, settings_type).await? {
        Some(document) if document.is_published() => Ok(Json(document)),
        _ => Err(not_configured(settings_type)),
    }
}

/// GET /api/v1/settings/:type/watch
pub async fn watch_settings(
    State(state): State<AppState>,
    Path(settings_type): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let settings_type = parse_type(&settings_type)?;
    Ok(document_events(
        &state,
        Collection::Settings,
        settings_type.as_str().to_string(),
        true,
    ))
}

/// GET /api/v1/admin/settings/:type
pub async fn get_settings(
    State(state): State<AppState>,
    Path(settings_type): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let settings_type = parse_type(&settings_type)?;
    load(&state, settings_type)
        .await?
        .map(Json)
        .ok_or_else(|| not_configured(settings_type))
}

/// Create the section on first save, update it afterwards.
///
/// PUT /api/v1/admin/settings/:type
pub async fn save_settings(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(settings_type): Path<String>,
    Json(payload): Json<JsonValue>,
) -> Result<impl IntoResponse, ApiError> {
    let settings_type = parse_type(&settings_type)?;
    let data = settings_type.parse_payload(payload)?;

    let document = state
        .content
        .save_settings(settings_type, data, &admin.actor())
        .await?;
    record_content_mutation(Collection::Settings.as_str(), "save");

    Ok(Json(document))
}
