//! Generic collection routes: admin listing and live collection streams.
//!
//! Also holds the helpers the per-collection routers share.

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    routing::get,
    Json, Router,
};
use domain::models::{to_document_data, Collection, DocumentData, ListFilter};
use domain::services::{CollectionSubscription, ContentError, DocumentSubscription};
use futures_util::stream::{self, Stream};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AdminUser;
use crate::middleware::user_auth::{authenticate, authorize_admin};

/// Create the public content router.
pub fn public_router() -> Router<AppState> {
    Router::new().route("/:collection/watch", get(watch_collection))
}

/// Create the admin content router.
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/:collection", get(list_collection))
        .route("/:collection/watch", get(watch_collection_admin))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchQuery {
    pub published_only: Option<bool>,
}

/// Response for a collection listing.
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
}

pub(crate) fn parse_collection(raw: &str) -> Result<Collection, ApiError> {
    raw.parse::<Collection>().map_err(ApiError::NotFound)
}

/// Serializes a partial update, rejecting one that sets nothing.
pub(crate) fn patch_data<T: Serialize>(request: &T) -> Result<DocumentData, ApiError> {
    let data = to_document_data(request).map_err(ContentError::from)?;
    if data.is_empty() {
        return Err(ApiError::Validation("No fields to update".to_string()));
    }
    Ok(data)
}

/// Server-sent events for a live collection view.
pub(crate) fn collection_events(
    state: &AppState,
    collection: Collection,
    published_only: bool,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let subscription =
        CollectionSubscription::new(state.documents.clone(), collection, published_only);
    let events = stream::unfold(subscription, |mut subscription| async move {
        let current = subscription.next().await?;
        Some((Event::default().json_data(&current), subscription))
    });
    Sse::new(events).keep_alive(KeepAlive::default())
}

/// Server-sent events for a live single-document view.
pub(crate) fn document_events(
    state: &AppState,
    collection: Collection,
    id: String,
    published_only: bool,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let subscription =
        DocumentSubscription::new(state.documents.clone(), collection, id, published_only);
    let events = stream::unfold(subscription, |mut subscription| async move {
        let current = subscription.next().await?;
        Some((Event::default().json_data(&current), subscription))
    });
    Sse::new(events).keep_alive(KeepAlive::default())
}

/// List every document in a collection, published or not.
///
/// GET /api/v1/admin/content/:collection
pub async fn list_collection(
    State(state): State<AppState>,
    Path(collection): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let collection = parse_collection(&collection)?;
    let data = state.content.list(collection, ListFilter::all()).await?;
    Ok(Json(ListResponse { data }))
}

/// Live view of a collection.
///
/// Published documents only unless `publishedOnly=false`, which needs an
/// admin session.
///
/// GET /api/v1/content/:collection/watch
pub async fn watch_collection(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Query(query): Query<WatchQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let collection = parse_collection(&collection)?;
    let published_only = query.published_only.unwrap_or(true);
    if !published_only {
        let auth = authenticate(&state, &headers)?;
        authorize_admin(&state, &auth).await?;
    }
    Ok(collection_events(&state, collection, published_only))
}

/// Live view of a collection for the admin console; everything by default.
///
/// GET /api/v1/admin/content/:collection/watch
pub async fn watch_collection_admin(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(collection): Path<String>,
    Query(query): Query<WatchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let collection = parse_collection(&collection)?;
    let published_only = query.published_only.unwrap_or(false);
    Ok(collection_events(&state, collection, published_only))
}
