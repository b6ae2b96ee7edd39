//! Gallery image routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use domain::models::{
    to_document_data, Collection, CreateGalleryImageRequest, ListFilter,
    UpdateGalleryImageRequest, ORDER_FIELD,
};
use domain::services::ContentError;
use serde_json::Value as JsonValue;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AdminUser;
use crate::middleware::metrics::record_content_mutation;
use crate::routes::content::{patch_data, ListResponse};

const COLLECTION: Collection = Collection::Gallery;

pub fn public_router() -> Router<AppState> {
    Router::new().route("/", get(list_published_images))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_images).post(create_image))
        .route(
            "/:id",
            get(get_image).put(update_image).delete(delete_image),
        )
}

/// Published images in display order.
///
/// GET /api/v1/gallery
pub async fn list_published_images(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let data = state
        .content
        .list(COLLECTION, ListFilter::published_only())
        .await?;
    Ok(Json(ListResponse { data }))
}

pub async fn list_images(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let data = state.content.list(COLLECTION, ListFilter::all()).await?;
    Ok(Json(ListResponse { data }))
}

/// Add an image; without an explicit order it goes last.
///
/// POST /api/v1/admin/gallery
pub async fn create_image(
    State(state): State<AppState>,
    admin: AdminUser,
    Json(request): Json<CreateGalleryImageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate()?;

    let mut data = to_document_data(&request).map_err(ContentError::from)?;
    if request.order.is_none() {
        let order = state.content.next_order(COLLECTION).await?;
        data.insert(ORDER_FIELD.to_string(), JsonValue::from(order));
    }

    let document = state
        .content
        .create(COLLECTION, data, &admin.actor())
        .await?;
    record_content_mutation(COLLECTION.as_str(), "create");

    Ok((StatusCode::CREATED, Json(document)))
}

pub async fn get_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.content.get(COLLECTION, &id).await?))
}

pub async fn update_image(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<String>,
    Json(request): Json<UpdateGalleryImageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate()?;
    let data = patch_data(&request)?;

    let document = state
        .content
        .update(COLLECTION, &id, data, &admin.actor())
        .await?;
    record_content_mutation(COLLECTION.as_str(), "update");

    Ok(Json(document))
}

/// Removes the gallery entry. The stored image file is left in place; the
/// console deletes it separately through the uploads endpoint.
pub async fn delete_image(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.content.delete(COLLECTION, &id, &admin.actor()).await?;
    record_content_mutation(COLLECTION.as_str(), "delete");

    Ok(StatusCode::NO_CONTENT)
}
