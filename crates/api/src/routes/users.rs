//! User administration routes.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use domain::models::{Role, UpdateRoleRequest, UserProfile};
use serde::Serialize;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AdminUser;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/:uid/role", put(update_role))
}

#[derive(Debug, Serialize)]
pub struct ListUsersResponse {
    pub data: Vec<UserProfile>,
}

/// GET /api/v1/admin/users
pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let data = state.auth.list_users().await?;
    Ok(Json(ListUsersResponse { data }))
}

/// Grant or revoke the admin role.
///
/// PUT /api/v1/admin/users/:uid/role
pub async fn update_role(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(uid): Path<String>,
    Json(request): Json<UpdateRoleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // An admin cannot lock themselves out of the console.
    if uid == admin.auth.uid && request.role != Role::Admin {
        return Err(ApiError::Validation(
            "Admins cannot remove their own admin role".to_string(),
        ));
    }

    let profile = state
        .auth
        .change_role(&admin.actor(), &uid, request.role)
        .await?;
    Ok(Json(profile))
}
