//! Content CRUD with audit trail.
//!
//! Every mutation stamps `updatedAt`/`updatedBy` (plus `createdAt` on
//! create), writes the document, then appends an audit entry through
//! [`AuditRecorder`]. The two writes are not atomic.

use chrono::Utc;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use thiserror::Error;

use crate::models::document::{ORDER_FIELD, PUBLISHED_FIELD};
use crate::models::{
    to_document_data, AuditAction, AuditChanges, Collection, CreateServiceRequest, Document,
    DocumentData, ListFilter, SettingsType,
};
use crate::store::{DocumentStore, StoreError};

use super::audit::{diff_changes, AuditRecorder};

/// The signed-in user performing a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub uid: String,
    pub email: Option<String>,
}

impl Actor {
    pub fn new(uid: impl Into<String>, email: Option<String>) -> Self {
        Self {
            uid: uid.into(),
            email,
        }
    }
}

/// Errors from content operations.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("{collection} document not found: {id}")]
    NotFound { collection: Collection, id: String },

    #[error("Invalid content: {0}")]
    Invalid(String),

    #[error(transparent)]
    Store(StoreError),
}

impl ContentError {
    fn from_store(err: StoreError, collection: Collection, id: &str) -> Self {
        match err {
            StoreError::NotFound(_) => ContentError::NotFound {
                collection,
                id: id.to_string(),
            },
            other => ContentError::Store(other),
        }
    }
}

impl From<StoreError> for ContentError {
    fn from(err: StoreError) -> Self {
        ContentError::Store(err)
    }
}

impl From<serde_json::Error> for ContentError {
    fn from(err: serde_json::Error) -> Self {
        ContentError::Invalid(err.to_string())
    }
}

/// Audited create/update/delete over the content collections.
#[derive(Clone)]
pub struct ContentService {
    documents: Arc<dyn DocumentStore>,
    audit: AuditRecorder,
}

impl ContentService {
    pub fn new(documents: Arc<dyn DocumentStore>, audit: AuditRecorder) -> Self {
        Self { documents, audit }
    }

    pub async fn list(
        &self,
        collection: Collection,
        filter: ListFilter,
    ) -> Result<Vec<Document>, ContentError> {
        Ok(self.documents.list(collection, filter).await?)
    }

    pub async fn get(&self, collection: Collection, id: &str) -> Result<Document, ContentError> {
        self.documents
            .get(collection, id)
            .await?
            .ok_or_else(|| ContentError::NotFound {
                collection,
                id: id.to_string(),
            })
    }

    /// Creates a document with a generated id.
    ///
    /// `published` defaults to `false` when absent.
    pub async fn create(
        &self,
        collection: Collection,
        data: DocumentData,
        actor: &Actor,
    ) -> Result<Document, ContentError> {
        self.create_document(collection, None, data, actor).await
    }

    /// Creates a service, assigning `order = count + 1` when none is given.
    pub async fn create_service(
        &self,
        request: &CreateServiceRequest,
        actor: &Actor,
    ) -> Result<Document, ContentError> {
        let mut data = to_document_data(request)?;
        if request.order.is_none() {
            let order = self.next_order(Collection::Services).await?;
            data.insert(ORDER_FIELD.to_string(), JsonValue::from(order));
        }
        self.create(Collection::Services, data, actor).await
    }

    /// Merges `data` into an existing document.
    pub async fn update(
        &self,
        collection: Collection,
        id: &str,
        data: DocumentData,
        actor: &Actor,
    ) -> Result<Document, ContentError> {
        let original = self.get(collection, id).await?;

        let mut patch = data.clone();
        stamp(&mut patch, actor, false);

        let updated = self
            .documents
            .update(collection, id, patch)
            .await
            .map_err(|e| ContentError::from_store(e, collection, id))?;

        log_mutation(collection, AuditAction::Update);
        let changes = diff_changes(&original.data, &data);
        self.audit
            .record(
                actor,
                AuditAction::Update,
                collection.as_str(),
                id,
                Some(AuditChanges::Diff(changes)),
            )
            .await;

        Ok(updated)
    }

    pub async fn delete(
        &self,
        collection: Collection,
        id: &str,
        actor: &Actor,
    ) -> Result<(), ContentError> {
        let existed = self
            .documents
            .delete(collection, id)
            .await
            .map_err(|e| ContentError::from_store(e, collection, id))?;
        if !existed {
            return Err(ContentError::NotFound {
                collection,
                id: id.to_string(),
            });
        }

        log_mutation(collection, AuditAction::Delete);
        self.audit
            .record(actor, AuditAction::Delete, collection.as_str(), id, None)
            .await;
        Ok(())
    }

    /// Flips a single boolean field. Absent fields count as `false`.
    pub async fn toggle_flag(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        actor: &Actor,
    ) -> Result<Document, ContentError> {
        let current = self.get(collection, id).await?.flag(field).unwrap_or(false);
        let mut patch = DocumentData::new();
        patch.insert(field.to_string(), JsonValue::Bool(!current));
        self.update(collection, id, patch, actor).await
    }

    /// Upserts the settings document for `settings_type`.
    ///
    /// The document id is the type name, so there is never more than one
    /// document per type.
    pub async fn save_settings(
        &self,
        settings_type: SettingsType,
        data: DocumentData,
        actor: &Actor,
    ) -> Result<Document, ContentError> {
        let id = settings_type.as_str();
        let existing = self.documents.get(Collection::Settings, id).await?;
        if existing.is_some() {
            return self.update(Collection::Settings, id, data, actor).await;
        }

        match self
            .create_document(Collection::Settings, Some(id.to_string()), data.clone(), actor)
            .await
        {
            // Lost a race with a concurrent first save.
            Err(ContentError::Store(StoreError::Conflict(_))) => {
                self.update(Collection::Settings, id, data, actor).await
            }
            other => other,
        }
    }

    /// Order value for the next document appended to a collection.
    pub async fn next_order(&self, collection: Collection) -> Result<i64, ContentError> {
        let count = self.documents.list(collection, ListFilter::all()).await?.len();
        Ok(count as i64 + 1)
    }

    async fn create_document(
        &self,
        collection: Collection,
        id: Option<String>,
        data: DocumentData,
        actor: &Actor,
    ) -> Result<Document, ContentError> {
        let mut stamped = data.clone();
        stamp(&mut stamped, actor, true);
        if !stamped.contains_key(PUBLISHED_FIELD) {
            stamped.insert(PUBLISHED_FIELD.to_string(), JsonValue::Bool(false));
        }

        let created = self.documents.create(collection, id, stamped).await?;

        log_mutation(collection, AuditAction::Create);
        self.audit
            .record(
                actor,
                AuditAction::Create,
                collection.as_str(),
                &created.id,
                Some(AuditChanges::Data(JsonValue::Object(data))),
            )
            .await;

        Ok(created)
    }
}

fn stamp(data: &mut DocumentData, actor: &Actor, created: bool) {
    let now = JsonValue::String(Utc::now().to_rfc3339());
    if created {
        data.insert("createdAt".to_string(), now.clone());
    }
    data.insert("updatedAt".to_string(), now);
    data.insert("updatedBy".to_string(), JsonValue::String(actor.uid.clone()));
}

fn log_mutation(collection: Collection, action: AuditAction) {
    tracing::info!(
        collection = %collection,
        action = %action,
        "Content mutated"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuditEntry, ServiceFlag};
    use crate::services::testing::{MemoryAuditLog, MemoryDocuments};
    use serde_json::json;

    fn data(value: JsonValue) -> DocumentData {
        value.as_object().cloned().unwrap()
    }

    fn setup() -> (ContentService, Arc<MemoryDocuments>, Arc<MemoryAuditLog>) {
        let docs = Arc::new(MemoryDocuments::default());
        let audit = Arc::new(MemoryAuditLog::default());
        let service = ContentService::new(docs.clone(), AuditRecorder::new(audit.clone()));
        (service, docs, audit)
    }

    fn admin() -> Actor {
        Actor::new("uid-admin", Some("admin@clinic.test".to_string()))
    }

    fn last(audit: &MemoryAuditLog) -> AuditEntry {
        audit.entries().last().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_create_stamps_and_defaults_published() {
        let (service, _, audit) = setup();
        let doc = service
            .create(Collection::Testimonials, data(json!({"authorName": "Ana"})), &admin())
            .await
            .unwrap();

        assert_eq!(doc.data["published"], false);
        assert_eq!(doc.data["updatedBy"], "uid-admin");
        assert!(doc.data.contains_key("createdAt"));
        assert!(doc.data.contains_key("updatedAt"));

        let entry = last(&audit);
        assert_eq!(entry.action, AuditAction::Create);
        assert_eq!(entry.collection, "testimonials");
        assert_eq!(entry.document_id, doc.id);
        assert_eq!(entry.user_email.as_deref(), Some("admin@clinic.test"));
        assert_eq!(
            entry.changes,
            Some(AuditChanges::Data(json!({"authorName": "Ana"})))
        );
    }

    #[tokio::test]
    async fn test_update_records_diff_of_submitted_fields() {
        let (service, _, audit) = setup();
        let doc = service
            .create(
                Collection::Services,
                data(json!({"title": "Limpieza", "emoji": "🦷", "published": true})),
                &admin(),
            )
            .await
            .unwrap();

        let updated = service
            .update(
                Collection::Services,
                &doc.id,
                data(json!({"title": "Limpieza profunda", "emoji": "🦷"})),
                &admin(),
            )
            .await
            .unwrap();
        assert_eq!(updated.data["title"], "Limpieza profunda");
        assert_eq!(updated.data["published"], true);

        let entry = last(&audit);
        assert_eq!(entry.action, AuditAction::Update);
        match entry.changes {
            Some(AuditChanges::Diff(diff)) => {
                assert_eq!(diff.len(), 1);
                assert!(diff.contains_key("title"));
            }
            other => panic!("unexpected changes: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let (service, _, audit) = setup();
        let err = service
            .update(Collection::Services, "nope", data(json!({"title": "x"})), &admin())
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::NotFound { .. }));
        assert!(audit.entries().is_empty());
    }

    #[tokio::test]
    async fn test_delete_then_missing() {
        let (service, _, audit) = setup();
        let doc = service
            .create(Collection::Gallery, data(json!({"imageUrl": "https://x/y.png"})), &admin())
            .await
            .unwrap();
        service.delete(Collection::Gallery, &doc.id, &admin()).await.unwrap();

        let entry = last(&audit);
        assert_eq!(entry.action, AuditAction::Delete);
        assert!(entry.changes.is_none());

        let err = service
            .delete(Collection::Gallery, &doc.id, &admin())
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_audit_failure_does_not_fail_primary_write() {
        let docs = Arc::new(MemoryDocuments::default());
        let service = ContentService::new(
            docs.clone(),
            AuditRecorder::new(Arc::new(MemoryAuditLog::failing())),
        );
        let doc = service
            .create(Collection::Services, data(json!({"title": "Ortodoncia"})), &admin())
            .await
            .unwrap();
        assert!(docs.get(Collection::Services, &doc.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_toggle_changes_only_that_flag() {
        let (service, _, _) = setup();
        let request: CreateServiceRequest = serde_json::from_value(json!({
            "title": "Blanqueamiento",
            "description": "Color natural",
            "emoji": "⚡",
            "animation": "pulse"
        }))
        .unwrap();
        let doc = service.create_service(&request, &admin()).await.unwrap();
        assert_eq!(doc.data["active"], true);

        let toggled = service
            .toggle_flag(
                Collection::Services,
                &doc.id,
                ServiceFlag::Active.field_name(),
                &admin(),
            )
            .await
            .unwrap();

        assert_eq!(toggled.data["active"], false);
        for key in ["title", "description", "emoji", "animation", "order", "published", "createdAt"] {
            assert_eq!(toggled.data[key], doc.data[key], "field {} changed", key);
        }
    }

    #[tokio::test]
    async fn test_create_service_assigns_next_order() {
        let (service, _, _) = setup();
        let mk = |title: &str| -> CreateServiceRequest {
            serde_json::from_value(json!({"title": title, "description": "d"})).unwrap()
        };
        let first = service.create_service(&mk("Uno"), &admin()).await.unwrap();
        let second = service.create_service(&mk("Dos"), &admin()).await.unwrap();
        assert_eq!(first.order(), Some(1));
        assert_eq!(second.order(), Some(2));

        let mut explicit = mk("Tres");
        explicit.order = Some(10);
        let third = service.create_service(&explicit, &admin()).await.unwrap();
        assert_eq!(third.order(), Some(10));
    }

    #[tokio::test]
    async fn test_save_settings_creates_once_then_updates() {
        let (service, docs, audit) = setup();
        let first = service
            .save_settings(
                SettingsType::Contact,
                data(json!({"phone": "+573001112233", "type": "contact", "published": true})),
                &admin(),
            )
            .await
            .unwrap();
        assert_eq!(first.id, "contact");

        let second = service
            .save_settings(
                SettingsType::Contact,
                data(json!({"phone": "+573009998877", "type": "contact", "published": true})),
                &admin(),
            )
            .await
            .unwrap();
        assert_eq!(second.id, "contact");
        assert_eq!(second.data["phone"], "+573009998877");

        let all = docs.list(Collection::Settings, ListFilter::all()).await.unwrap();
        assert_eq!(all.len(), 1);

        let actions: Vec<_> = audit.entries().iter().map(|e| e.action).collect();
        assert_eq!(actions, vec![AuditAction::Create, AuditAction::Update]);
    }
}
