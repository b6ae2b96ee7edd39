//! Federated sign-in and role checks.
//!
//! The identity provider's ID token is verified by an [`IdentityVerifier`];
//! the user profile is then created or refreshed and a session JWT issued.
//! Roles always come from the stored profile, never from a token.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use shared::jwt::{JwtConfig, JwtError};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

use crate::models::{
    AuditAction, AuditChanges, FederatedIdentity, FieldChange, Role, SignInResponse, UserProfile,
};
use crate::store::{StoreError, UserStore};

use super::audit::AuditRecorder;
use super::content::Actor;

/// Audit collection name for user records.
pub const USERS_COLLECTION: &str = "users";

/// Errors from verifying a federated ID token.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Invalid ID token: {0}")]
    InvalidToken(String),

    #[error("Signing keys unavailable: {0}")]
    KeysUnavailable(String),
}

/// Verifies ID tokens issued by the federated identity provider.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, id_token: &str) -> Result<FederatedIdentity, IdentityError>;
}

/// Errors from auth operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error("Admin role required")]
    Forbidden,

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error(transparent)]
    Token(#[from] JwtError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Sign-in, session and role management.
#[derive(Clone)]
pub struct AuthService {
    verifier: Arc<dyn IdentityVerifier>,
    users: Arc<dyn UserStore>,
    jwt: Arc<JwtConfig>,
    audit: AuditRecorder,
    admin_emails: Vec<String>,
}

impl AuthService {
    pub fn new(
        verifier: Arc<dyn IdentityVerifier>,
        users: Arc<dyn UserStore>,
        jwt: Arc<JwtConfig>,
        audit: AuditRecorder,
        admin_emails: &[String],
    ) -> Self {
        Self {
            verifier,
            users,
            jwt,
            audit,
            admin_emails: admin_emails
                .iter()
                .map(|e| e.trim().to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    /// Verifies an ID token, upserts the profile and issues a session token.
    pub async fn sign_in(&self, id_token: &str) -> Result<SignInResponse, AuthError> {
        let identity = self.verifier.verify(id_token).await?;
        let now = Utc::now();

        let user = match self.users.get(&identity.uid).await? {
            Some(_) => self.users.record_login(&identity, now).await?,
            None => {
                let profile = UserProfile {
                    uid: identity.uid.clone(),
                    email: identity.email.clone(),
                    display_name: identity.display_name.clone(),
                    photo_url: identity.photo_url.clone(),
                    role: self.initial_role(&identity),
                    created_at: now,
                    last_login_at: now,
                };
                match self.users.insert(profile).await {
                    Ok(created) => {
                        tracing::info!(
                            uid = %created.uid,
                            role = %created.role,
                            "User profile created"
                        );
                        created
                    }
                    // First sign-in raced with another request for the same uid.
                    Err(StoreError::Conflict(_)) => {
                        self.users.record_login(&identity, now).await?
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        };

        let issued = self.jwt.issue_session(&user.uid, user.email.as_deref())?;
        tracing::info!(uid = %user.uid, "User signed in");

        Ok(SignInResponse {
            access_token: issued.token,
            token_type: "Bearer",
            expires_in: issued.expires_in,
            user,
        })
    }

    /// Current profile of a signed-in user.
    pub async fn current_user(&self, uid: &str) -> Result<UserProfile, AuthError> {
        self.users
            .get(uid)
            .await?
            .ok_or_else(|| AuthError::UserNotFound(uid.to_string()))
    }

    /// Loads the profile and fails unless its stored role is admin.
    pub async fn require_admin(&self, uid: &str) -> Result<UserProfile, AuthError> {
        let user = self.current_user(uid).await?;
        if !user.is_admin() {
            return Err(AuthError::Forbidden);
        }
        Ok(user)
    }

    pub async fn list_users(&self) -> Result<Vec<UserProfile>, AuthError> {
        Ok(self.users.list().await?)
    }

    /// Changes a user's role and records a `ROLE_CHANGE` audit entry.
    pub async fn change_role(
        &self,
        actor: &Actor,
        uid: &str,
        role: Role,
    ) -> Result<UserProfile, AuthError> {
        let before = self.current_user(uid).await?;
        let updated = self.users.set_role(uid, role).await.map_err(|e| match e {
            StoreError::NotFound(_) => AuthError::UserNotFound(uid.to_string()),
            other => AuthError::Store(other),
        })?;

        let mut diff = BTreeMap::new();
        diff.insert(
            "role".to_string(),
            FieldChange::new(Some(json!(before.role)), Some(json!(updated.role))),
        );
        self.audit
            .record(
                actor,
                AuditAction::RoleChange,
                USERS_COLLECTION,
                uid,
                Some(AuditChanges::Diff(diff)),
            )
            .await;

        tracing::info!(uid = %uid, role = %role, by = %actor.uid, "User role changed");
        Ok(updated)
    }

    fn initial_role(&self, identity: &FederatedIdentity) -> Role {
        let listed = identity
            .email
            .as_deref()
            .map(|e| self.admin_emails.contains(&e.to_lowercase()))
            .unwrap_or(false);
        if listed && identity.email_verified {
            Role::Admin
        } else {
            Role::User
        }
    }
}
