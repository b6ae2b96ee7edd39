//! User profile entity.

use chrono::{DateTime, Utc};
use domain::models::{Role, UserProfile};
use sqlx::FromRow;

/// Database row of the `users` table.
#[derive(Debug, Clone, FromRow)]
pub struct UserEntity {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
}

impl From<UserEntity> for UserProfile {
    fn from(entity: UserEntity) -> Self {
        Self {
            uid: entity.uid,
            email: entity.email,
            display_name: entity.display_name,
            photo_url: entity.photo_url,
            // Constrained by the table; an unexpected value grants nothing.
            role: entity.role.parse().unwrap_or(Role::User),
            created_at: entity.created_at,
            last_login_at: entity.last_login_at,
        }
    }
}
