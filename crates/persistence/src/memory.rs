//! In-memory storage backend.
//!
//! Implements every storage trait over process memory. Used when
//! `storage.backend = "memory"` and by the API integration tests. Data is
//! lost on restart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::models::{
    sort_by_order, AuditEntry, ChangeEvent, ChangeKind, Collection, Document, DocumentData,
    FederatedIdentity, ListAuditLogsQuery, ListFilter, NewAuditEntry, Role, UserProfile,
};
use domain::store::{AuditLogStore, DocumentStore, StoreError, UserStore};
use std::collections::HashMap;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::changes::ChangeFeed;

/// Process-local store for documents, users and audit entries.
#[derive(Default)]
pub struct InMemoryStore {
    // Kept in insertion order so listings are stable on creation time.
    documents: RwLock<Vec<Document>>,
    users: RwLock<HashMap<String, UserProfile>>,
    audit: RwLock<Vec<AuditEntry>>,
    changes: ChangeFeed,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn list(
        &self,
        collection: Collection,
        filter: ListFilter,
    ) -> Result<Vec<Document>, StoreError> {
        let mut documents: Vec<Document> = self
            .documents
            .read()
            .await
            .iter()
            .filter(|d| d.collection == collection && filter.matches(d))
            .cloned()
            .collect();
        sort_by_order(&mut documents);
        Ok(documents)
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self
            .documents
            .read()
            .await
            .iter()
            .find(|d| d.collection == collection && d.id == id)
            .cloned())
    }

    fn watch(&self, collection: Collection) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe(collection)
    }

    async fn create(
        &self,
        collection: Collection,
        id: Option<String>,
        data: DocumentData,
    ) -> Result<Document, StoreError> {
        let id = id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let document = {
            let mut documents = self.documents.write().await;
            if documents
                .iter()
                .any(|d| d.collection == collection && d.id == id)
            {
                return Err(StoreError::Conflict(format!("{}/{}", collection, id)));
            }
            let now = Utc::now();
            let document = Document {
                id,
                collection,
                data,
                created_at: now,
                updated_at: now,
            };
            documents.push(document.clone());
            document
        };
        self.changes
            .publish(collection, &document.id, ChangeKind::Created);
        Ok(document)
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: DocumentData,
    ) -> Result<Document, StoreError> {
        let document = {
            let mut documents = self.documents.write().await;
            let document = documents
                .iter_mut()
                .find(|d| d.collection == collection && d.id == id)
                .ok_or_else(|| StoreError::NotFound(format!("{}/{}", collection, id)))?;
            document.data.extend(patch);
            document.updated_at = Utc::now();
            document.clone()
        };
        self.changes.publish(collection, id, ChangeKind::Updated);
        Ok(document)
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, StoreError> {
        let deleted = {
            let mut documents = self.documents.write().await;
            let before = documents.len();
            documents.retain(|d| !(d.collection == collection && d.id == id));
            documents.len() != before
        };
        if deleted {
            self.changes.publish(collection, id, ChangeKind::Deleted);
        }
        Ok(deleted)
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn get(&self, uid: &str) -> Result<Option<UserProfile>, StoreError> {
        Ok(self.users.read().await.get(uid).cloned())
    }

    async fn insert(&self, profile: UserProfile) -> Result<UserProfile, StoreError> {
        let mut users = self.users.write().await;
        if users.contains_key(&profile.uid) {
            return Err(StoreError::Conflict(profile.uid));
        }
        users.insert(profile.uid.clone(), profile.clone());
        Ok(profile)
    }

    async fn record_login(
        &self,
        identity: &FederatedIdentity,
        at: DateTime<Utc>,
    ) -> Result<UserProfile, StoreError> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&identity.uid)
            .ok_or_else(|| StoreError::NotFound(identity.uid.clone()))?;
        user.email = identity.email.clone();
        user.display_name = identity.display_name.clone();
        user.photo_url = identity.photo_url.clone();
        user.last_login_at = at;
        Ok(user.clone())
    }

    async fn set_role(&self, uid: &str, role: Role) -> Result<UserProfile, StoreError> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(uid)
            .ok_or_else(|| StoreError::NotFound(uid.to_string()))?;
        user.role = role;
        Ok(user.clone())
    }

    async fn list(&self) -> Result<Vec<UserProfile>, StoreError> {
        let mut users: Vec<UserProfile> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }
}

#[async_trait]
impl AuditLogStore for InMemoryStore {
    async fn append(&self, entry: NewAuditEntry) -> Result<AuditEntry, StoreError> {
        let entry = entry.into_entry();
        self.audit.write().await.push(entry.clone());
        Ok(entry)
    }

    async fn list(&self, query: &ListAuditLogsQuery) -> Result<Vec<AuditEntry>, StoreError> {
        Ok(self
            .audit
            .read()
            .await
            .iter()
            .rev()
            .filter(|e| query.matches(e))
            .take(query.effective_limit() as usize)
            .cloned()
            .collect())
    }
}
