//! Session authentication middleware.
//!
//! `require_user_auth` validates the bearer session token. `require_admin`
//! additionally loads the user record and checks its role; the token itself
//! never grants admin rights.

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use domain::models::UserProfile;
use domain::services::{Actor, AuthError};
use shared::jwt::{JwtConfig, JwtError};

use crate::app::AppState;
use crate::error::ApiError;

/// Authenticated caller, inserted into request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAuth {
    /// Identity provider uid (token subject).
    pub uid: String,
    pub email: Option<String>,
    /// Session token id.
    pub jti: String,
}

impl UserAuth {
    /// Validates a session token.
    pub fn validate(jwt: &JwtConfig, token: &str) -> Result<Self, JwtError> {
        let claims = jwt.validate_session(token)?;
        Ok(UserAuth {
            uid: claims.sub,
            email: claims.email,
            jti: claims.jti,
        })
    }

    /// The caller as recorded in audit entries.
    pub fn actor(&self) -> Actor {
        Actor::new(self.uid.clone(), self.email.clone())
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &axum::http::HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Authenticates the request from its bearer token.
pub fn authenticate(state: &AppState, headers: &axum::http::HeaderMap) -> Result<UserAuth, ApiError> {
    let token = bearer_token(headers).ok_or_else(|| {
        ApiError::Unauthorized("Missing or invalid Authorization header".to_string())
    })?;

    UserAuth::validate(&state.jwt, token).map_err(|e| {
        tracing::debug!(error = %e, "Session token rejected");
        ApiError::Unauthorized("Invalid or expired token".to_string())
    })
}

/// Middleware that requires a valid session token.
pub async fn require_user_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    match authenticate(&state, req.headers()) {
        Ok(auth) => {
            req.extensions_mut().insert(auth);
            next.run(req).await
        }
        Err(e) => e.into_response(),
    }
}

/// Loads the caller's user record and fails unless its role is admin.
pub async fn authorize_admin(state: &AppState, auth: &UserAuth) -> Result<UserProfile, ApiError> {
    match state.auth.require_admin(&auth.uid).await {
        Ok(profile) => Ok(profile),
        Err(AuthError::Forbidden) | Err(AuthError::UserNotFound(_)) => {
            tracing::info!(uid = %auth.uid, "Admin access denied");
            Err(ApiError::Forbidden("Admin role required".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Middleware that requires a session whose user record has the admin role.
///
/// Inserts both the [`UserAuth`] and the freshly loaded [`UserProfile`].
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let auth = match authenticate(&state, req.headers()) {
        Ok(auth) => auth,
        Err(e) => return e.into_response(),
    };

    match authorize_admin(&state, &auth).await {
        Ok(profile) => {
            req.extensions_mut().insert(auth);
            req.extensions_mut().insert::<UserProfile>(profile);
            next.run(req).await
        }
        Err(e) => e.into_response(),
    }
}
