//! In-process fakes of the storage traits for unit tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::{
    sort_by_order, AuditEntry, ChangeEvent, ChangeKind, Collection, Document, DocumentData,
    FederatedIdentity, ListAuditLogsQuery, ListFilter, NewAuditEntry, Role, UserProfile,
};
use crate::store::{AuditLogStore, DocumentStore, StoreError, UserStore};

pub struct MemoryDocuments {
    docs: Mutex<Vec<Document>>,
    channels: HashMap<Collection, broadcast::Sender<ChangeEvent>>,
}

impl Default for MemoryDocuments {
    fn default() -> Self {
        let channels = Collection::ALL
            .iter()
            .map(|c| (*c, broadcast::channel(16).0))
            .collect();
        Self {
            docs: Mutex::new(Vec::new()),
            channels,
        }
    }
}

impl MemoryDocuments {
    fn notify(&self, collection: Collection, id: &str, kind: ChangeKind) {
        if let Some(tx) = self.channels.get(&collection) {
            let _ = tx.send(ChangeEvent {
                collection,
                id: id.to_string(),
                kind,
            });
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryDocuments {
    async fn list(
        &self,
        collection: Collection,
        filter: ListFilter,
    ) -> Result<Vec<Document>, StoreError> {
        let mut out: Vec<Document> = self
            .docs
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.collection == collection && filter.matches(d))
            .cloned()
            .collect();
        sort_by_order(&mut out);
        Ok(out)
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self
            .docs
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.collection == collection && d.id == id)
            .cloned())
    }

    fn watch(&self, collection: Collection) -> broadcast::Receiver<ChangeEvent> {
        self.channels[&collection].subscribe()
    }

    async fn create(
        &self,
        collection: Collection,
        id: Option<String>,
        data: DocumentData,
    ) -> Result<Document, StoreError> {
        let id = id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let doc = {
            let mut docs = self.docs.lock().unwrap();
            if docs.iter().any(|d| d.collection == collection && d.id == id) {
                return Err(StoreError::Conflict(id));
            }
            let now = Utc::now();
            let doc = Document {
                id: id.clone(),
                collection,
                data,
                created_at: now,
                updated_at: now,
            };
            docs.push(doc.clone());
            doc
        };
        self.notify(collection, &id, ChangeKind::Created);
        Ok(doc)
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: DocumentData,
    ) -> Result<Document, StoreError> {
        let doc = {
            let mut docs = self.docs.lock().unwrap();
            let doc = docs
                .iter_mut()
                .find(|d| d.collection == collection && d.id == id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            doc.data.extend(patch);
            doc.updated_at = Utc::now();
            doc.clone()
        };
        self.notify(collection, id, ChangeKind::Updated);
        Ok(doc)
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, StoreError> {
        let removed = {
            let mut docs = self.docs.lock().unwrap();
            let before = docs.len();
            docs.retain(|d| !(d.collection == collection && d.id == id));
            docs.len() != before
        };
        if removed {
            self.notify(collection, id, ChangeKind::Deleted);
        }
        Ok(removed)
    }
}

#[derive(Default)]
pub struct MemoryAuditLog {
    entries: Mutex<Vec<AuditEntry>>,
    fail: bool,
}

impl MemoryAuditLog {
    pub fn failing() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuditLogStore for MemoryAuditLog {
    async fn append(&self, entry: NewAuditEntry) -> Result<AuditEntry, StoreError> {
        if self.fail {
            return Err(StoreError::Backend("audit store unavailable".to_string()));
        }
        let entry = entry.into_entry();
        self.entries.lock().unwrap().push(entry.clone());
        Ok(entry)
    }

    async fn list(&self, query: &ListAuditLogsQuery) -> Result<Vec<AuditEntry>, StoreError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|e| query.matches(e))
            .take(query.effective_limit() as usize)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryUsers {
    users: Mutex<HashMap<String, UserProfile>>,
}

#[async_trait]
impl UserStore for MemoryUsers {
    async fn get(&self, uid: &str) -> Result<Option<UserProfile>, StoreError> {
        Ok(self.users.lock().unwrap().get(uid).cloned())
    }

    async fn insert(&self, profile: UserProfile) -> Result<UserProfile, StoreError> {
        let mut users = self.users.lock().unwrap();
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
        let mut users = self.users.lock().unwrap();
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
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(uid)
            .ok_or_else(|| StoreError::NotFound(uid.to_string()))?;
        user.role = role;
        Ok(user.clone())
    }

    async fn list(&self) -> Result<Vec<UserProfile>, StoreError> {
        let mut out: Vec<_> = self.users.lock().unwrap().values().cloned().collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }
}
