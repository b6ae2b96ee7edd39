//! Storage traits implemented by the persistence layer.
//!
//! Every backend (PostgreSQL, in-memory) implements all three stores so the
//! API can be wired against either one.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::models::{
    AuditEntry, ChangeEvent, Collection, Document, DocumentData, FederatedIdentity,
    ListAuditLogsQuery, ListFilter, NewAuditEntry, Role, UserProfile,
};

/// Capacity of each collection's change channel.
pub const WATCH_CHANNEL_CAPACITY: usize = 256;

/// Errors returned by storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Schemaless document collections with change notifications.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Lists a collection, filtered, sorted by `order` (stable on creation time).
    async fn list(
        &self,
        collection: Collection,
        filter: ListFilter,
    ) -> Result<Vec<Document>, StoreError>;

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError>;

    /// Subscribes to mutations in a collection. Dropping the receiver unsubscribes.
    fn watch(&self, collection: Collection) -> broadcast::Receiver<ChangeEvent>;

    /// Inserts a document. A generated id is used when `id` is `None`;
    /// an explicit id that already exists is a `Conflict`.
    async fn create(
        &self,
        collection: Collection,
        id: Option<String>,
        data: DocumentData,
    ) -> Result<Document, StoreError>;

    /// Shallow-merges `patch` into the stored data. Missing id is `NotFound`.
    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: DocumentData,
    ) -> Result<Document, StoreError>;

    /// Removes a document, returning whether it existed.
    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, StoreError>;
}

/// User profiles keyed by identity-provider subject.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get(&self, uid: &str) -> Result<Option<UserProfile>, StoreError>;

    /// Inserts a new profile. An existing uid is a `Conflict`.
    async fn insert(&self, profile: UserProfile) -> Result<UserProfile, StoreError>;

    /// Refreshes email, display name, photo and `lastLoginAt` of an existing profile.
    async fn record_login(
        &self,
        identity: &FederatedIdentity,
        at: DateTime<Utc>,
    ) -> Result<UserProfile, StoreError>;

    async fn set_role(&self, uid: &str, role: Role) -> Result<UserProfile, StoreError>;

    /// All profiles, newest first.
    async fn list(&self) -> Result<Vec<UserProfile>, StoreError>;
}

/// Append-only audit trail.
#[async_trait]
pub trait AuditLogStore: Send + Sync {
    async fn append(&self, entry: NewAuditEntry) -> Result<AuditEntry, StoreError>;

    /// Matching entries, newest first, capped by the query's limit.
    async fn list(&self, query: &ListAuditLogsQuery) -> Result<Vec<AuditEntry>, StoreError>;
}
