//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod audit_log;
pub mod document;
pub mod user;

pub use audit_log::AuditLogEntity;
pub use document::DocumentEntity;
pub use user::UserEntity;
