//! Derived links for the public site.

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use domain::models::{Collection, ContactSettings, LocationSettings, SettingsType};

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::SiteLinks;

pub fn router() -> Router<AppState> {
    Router::new().route("/links", get(site_links))
}

/// Call, chat, email and map links from the published contact and
/// location settings.
///
/// GET /api/v1/site/links
pub async fn site_links(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let contact = state
        .documents
        .get(Collection::Settings, SettingsType::Contact.as_str())
        .await?
        .and_then(|d| ContactSettings::try_from(&d).ok());
    let location = state
        .documents
        .get(Collection::Settings, SettingsType::Location.as_str())
        .await?
        .and_then(|d| LocationSettings::try_from(&d).ok());

    Ok(Json(SiteLinks::build(contact.as_ref(), location.as_ref())))
}
