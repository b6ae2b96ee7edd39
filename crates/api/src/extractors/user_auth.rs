//! Authenticated-caller extractors.
//!
//! Both prefer what the auth middleware already put into the request
//! extensions and fall back to validating the request themselves, so a
//! handler is safe even on a router without the middleware.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use domain::models::UserProfile;
use domain::services::Actor;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::user_auth::{authenticate, authorize_admin, UserAuth};

/// Caller holding a valid session token.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserAuth);

impl CurrentUser {
    pub fn uid(&self) -> &str {
        &self.0.uid
    }

    pub fn actor(&self) -> Actor {
        self.0.actor()
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(auth) = parts.extensions.get::<UserAuth>() {
            return Ok(CurrentUser(auth.clone()));
        }
        authenticate(state, &parts.headers).map(CurrentUser)
    }
}

/// Caller whose stored user record has the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub auth: UserAuth,
    pub profile: UserProfile,
}

impl AdminUser {
    /// Audit actor, using the stored email when the token carries none.
    pub fn actor(&self) -> Actor {
        Actor::new(
            self.auth.uid.clone(),
            self.auth.email.clone().or_else(|| self.profile.email.clone()),
        )
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(auth) = CurrentUser::from_request_parts(parts, state).await?;

        if let Some(profile) = parts.extensions.get::<UserProfile>() {
            if profile.uid == auth.uid && profile.is_admin() {
                return Ok(AdminUser {
                    auth,
                    profile: profile.clone(),
                });
            }
        }

        let profile = authorize_admin(state, &auth).await?;
        Ok(AdminUser { auth, profile })
    }
}
