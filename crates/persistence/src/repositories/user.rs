//! User repository for database operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::models::{FederatedIdentity, Role, UserProfile};
use domain::store::{StoreError, UserStore};
use sqlx::PgPool;

use super::{is_unique_violation, store_error};
use crate::entities::UserEntity;
use crate::metrics::QueryTimer;

/// Repository for user profiles.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Creates a new UserRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn get(&self, uid: &str) -> Result<Option<UserProfile>, StoreError> {
        let timer = QueryTimer::new("find_user_by_uid");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT uid, email, display_name, photo_url, role, created_at, last_login_at
            FROM users
            WHERE uid = $1
            "#,
        )
        .bind(uid)
        .fetch_optional(&self.pool)
        .await;
        Ok(timer.finish(result).map_err(store_error)?.map(Into::into))
    }

    async fn insert(&self, profile: UserProfile) -> Result<UserProfile, StoreError> {
        let timer = QueryTimer::new("create_user");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            INSERT INTO users (uid, email, display_name, photo_url, role, created_at, last_login_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING uid, email, display_name, photo_url, role, created_at, last_login_at
            "#,
        )
        .bind(&profile.uid)
        .bind(&profile.email)
        .bind(&profile.display_name)
        .bind(&profile.photo_url)
        .bind(profile.role.as_str())
        .bind(profile.created_at)
        .bind(profile.last_login_at)
        .fetch_one(&self.pool)
        .await;

        match timer.finish(result) {
            Ok(entity) => Ok(entity.into()),
            Err(e) if is_unique_violation(&e) => Err(StoreError::Conflict(profile.uid)),
            Err(e) => Err(store_error(e)),
        }
    }

    async fn record_login(
        &self,
        identity: &FederatedIdentity,
        at: DateTime<Utc>,
    ) -> Result<UserProfile, StoreError> {
        let timer = QueryTimer::new("update_user_login");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            UPDATE users
            SET email = $2, display_name = $3, photo_url = $4, last_login_at = $5
            WHERE uid = $1
            RETURNING uid, email, display_name, photo_url, role, created_at, last_login_at
            "#,
        )
        .bind(&identity.uid)
        .bind(&identity.email)
        .bind(&identity.display_name)
        .bind(&identity.photo_url)
        .bind(at)
        .fetch_optional(&self.pool)
        .await;

        timer
            .finish(result)
            .map_err(store_error)?
            .map(Into::into)
            .ok_or_else(|| StoreError::NotFound(identity.uid.clone()))
    }

    async fn set_role(&self, uid: &str, role: Role) -> Result<UserProfile, StoreError> {
        let timer = QueryTimer::new("update_user_role");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            UPDATE users
            SET role = $2
            WHERE uid = $1
            RETURNING uid, email, display_name, photo_url, role, created_at, last_login_at
            "#,
        )
        .bind(uid)
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await;

        timer
            .finish(result)
            .map_err(store_error)?
            .map(Into::into)
            .ok_or_else(|| StoreError::NotFound(uid.to_string()))
    }

    async fn list(&self) -> Result<Vec<UserProfile>, StoreError> {
        let timer = QueryTimer::new("list_users");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT uid, email, display_name, photo_url, role, created_at, last_login_at
            FROM users
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        Ok(timer
            .finish(result)
            .map_err(store_error)?
            .into_iter()
            .map(Into::into)
            .collect())
    }
}
