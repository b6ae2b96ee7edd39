//! PostgreSQL implementations of the domain storage traits.

pub mod audit_log;
pub mod document;
pub mod user;

pub use audit_log::AuditLogRepository;
pub use document::DocumentRepository;
pub use user::UserRepository;

use domain::store::StoreError;

/// SQLSTATE for unique constraint violations.
const UNIQUE_VIOLATION: &str = "23505";

pub(crate) fn store_error(err: sqlx::Error) -> StoreError {
    tracing::error!(error = %err, "Database error");
    StoreError::Backend(err.to_string())
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION))
}
