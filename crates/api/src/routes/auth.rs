//! Sign-in and session routes.

use axum::{extract::State, response::IntoResponse, Json};
use domain::models::SignInRequest;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::middleware::metrics::record_sign_in;

/// Exchange an identity-provider ID token for a session token.
///
/// The user record is created on first sign-in; addresses listed in the
/// configured admin emails start out as admins.
///
/// POST /api/v1/auth/sign-in
pub async fn sign_in(
    State(state): State<AppState>,
    Json(request): Json<SignInRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate()?;

    match state.auth.sign_in(&request.id_token).await {
        Ok(response) => {
            record_sign_in("success");
            Ok(Json(response))
        }
        Err(e) => {
            record_sign_in("failure");
            Err(e.into())
        }
    }
}

/// The signed-in user's profile, role included.
///
/// GET /api/v1/auth/me
pub async fn me(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    let profile = state.auth.current_user(user.uid()).await?;
    Ok(Json(profile))
}
