//! Clinic service routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use domain::models::{
    Collection, CreateServiceRequest, ListFilter, ToggleServiceRequest, UpdateServiceRequest,
};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AdminUser;
use crate::middleware::metrics::record_content_mutation;
use crate::routes::content::{patch_data, ListResponse};

/// Create the public services router.
pub fn public_router() -> Router<AppState> {
    Router::new().route("/", get(list_published_services))
}

/// Create the admin services router.
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_services).post(create_service))
        .route(
            "/:id",
            get(get_service).put(update_service).delete(delete_service),
        )
        .route("/:id/toggle", post(toggle_service))
}

/// GET /api/v1/services
pub async fn list_published_services(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let data = state
        .content
        .list(Collection::Services, ListFilter::published_only())
        .await?;
    Ok(Json(ListResponse { data }))
}

/// GET /api/v1/admin/services
pub async fn list_services(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let data = state
        .content
        .list(Collection::Services, ListFilter::all())
        .await?;
    Ok(Json(ListResponse { data }))
}

/// Create a service. Appended after the existing ones when no order is given.
///
/// POST /api/v1/admin/services
pub async fn create_service(
    State(state): State<AppState>,
    admin: AdminUser,
    Json(request): Json<CreateServiceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate()?;

    let document = state
        .content
        .create_service(&request, &admin.actor())
        .await?;
    record_content_mutation(Collection::Services.as_str(), "create");

    Ok((StatusCode::CREATED, Json(document)))
}

/// GET /api/v1/admin/services/:id
pub async fn get_service(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let document = state.content.get(Collection::Services, &id).await?;
    Ok(Json(document))
}

/// PUT /api/v1/admin/services/:id
pub async fn update_service(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<String>,
    Json(request): Json<UpdateServiceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate()?;
    let data = patch_data(&request)?;

    let document = state
        .content
        .update(Collection::Services, &id, data, &admin.actor())
        .await?;
    record_content_mutation(Collection::Services.as_str(), "update");

    Ok(Json(document))
}

/// DELETE /api/v1/admin/services/:id
pub async fn delete_service(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .content
        .delete(Collection::Services, &id, &admin.actor())
        .await?;
    record_content_mutation(Collection::Services.as_str(), "delete");

    Ok(StatusCode::NO_CONTENT)
}

/// Flip `active` or `published` without touching other fields.
///
/// POST /api/v1/admin/services/:id/toggle
pub async fn toggle_service(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<String>,
    Json(request): Json<ToggleServiceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let document = state
        .content
        .toggle_flag(
            Collection::Services,
            &id,
            request.field.field_name(),
            &admin.actor(),
        )
        .await?;
    record_content_mutation(Collection::Services.as_str(), "toggle");

    Ok(Json(document))
}
