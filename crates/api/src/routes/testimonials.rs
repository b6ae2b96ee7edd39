//! Patient testimonial routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use domain::models::{
    to_document_data, Collection, CreateTestimonialRequest, ListFilter, UpdateTestimonialRequest,
};
use domain::services::ContentError;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AdminUser;
use crate::middleware::metrics::record_content_mutation;
use crate::routes::content::{patch_data, ListResponse};

const COLLECTION: Collection = Collection::Testimonials;

pub fn public_router() -> Router<AppState> {
    Router::new().route("/", get(list_published_testimonials))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_testimonials).post(create_testimonial))
        .route(
            "/:id",
            get(get_testimonial)
                .put(update_testimonial)
                .delete(delete_testimonial),
        )
}

pub async fn list_published_testimonials(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let data = state
        .content
        .list(COLLECTION, ListFilter::published_only())
        .await?;
    Ok(Json(ListResponse { data }))
}

pub async fn list_testimonials(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let data = state.content.list(COLLECTION, ListFilter::all()).await?;
    Ok(Json(ListResponse { data }))
}

/// POST /api/v1/admin/testimonials
pub async fn create_testimonial(
    State(state): State<AppState>,
    admin: AdminUser,
    Json(request): Json<CreateTestimonialRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate()?;
    let data = to_document_data(&request).map_err(ContentError::from)?;

    let document = state
        .content
        .create(COLLECTION, data, &admin.actor())
        .await?;
    record_content_mutation(COLLECTION.as_str(), "create");

    Ok((StatusCode::CREATED, Json(document)))
}

pub async fn get_testimonial(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.content.get(COLLECTION, &id).await?))
}

/// PUT /api/v1/admin/testimonials/:id
pub async fn update_testimonial(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<String>,
    Json(request): Json<UpdateTestimonialRequest>,
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

/// DELETE /api/v1/admin/testimonials/:id
pub async fn delete_testimonial(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.content.delete(COLLECTION, &id, &admin.actor()).await?;
    record_content_mutation(COLLECTION.as_str(), "delete");

    Ok(StatusCode::NO_CONTENT)
}
