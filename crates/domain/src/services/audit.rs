//! Audit trail helpers.
//!
//! Entries are appended after the primary write has succeeded. A failed
//! append is logged and dropped; it never fails or rolls back the caller.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::models::{AuditAction, AuditChanges, DocumentData, FieldChange, NewAuditEntry};
use crate::store::AuditLogStore;

use super::content::Actor;

/// Lists each key of `updated` whose value differs from `original`.
///
/// Keys absent from `original` are reported with `before: None`.
pub fn diff_changes(original: &DocumentData, updated: &DocumentData) -> BTreeMap<String, FieldChange> {
    updated
        .iter()
        .filter(|(key, value)| original.get(key.as_str()) != Some(*value))
        .map(|(key, value)| {
            (
                key.clone(),
                FieldChange::new(original.get(key.as_str()).cloned(), Some(value.clone())),
            )
        })
        .collect()
}

/// Best-effort writer of audit entries.
#[derive(Clone)]
pub struct AuditRecorder {
    store: Arc<dyn AuditLogStore>,
}

impl AuditRecorder {
    pub fn new(store: Arc<dyn AuditLogStore>) -> Self {
        Self { store }
    }

    /// Appends an entry, logging instead of returning any failure.
    pub async fn record(
        &self,
        actor: &Actor,
        action: AuditAction,
        collection: &str,
        document_id: &str,
        changes: Option<AuditChanges>,
    ) {
        let entry = NewAuditEntry {
            action,
            collection: collection.to_string(),
            document_id: document_id.to_string(),
            user_id: actor.uid.clone(),
            user_email: actor.email.clone(),
            changes,
        };

        match self.store.append(entry).await {
            Ok(saved) => {
                tracing::debug!(
                    audit_id = %saved.id,
                    action = %action,
                    collection = %collection,
                    document_id = %document_id,
                    "Audit entry recorded"
                );
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    action = %action,
                    collection = %collection,
                    document_id = %document_id,
                    "Could not record audit entry"
                );
            }
        }
    }
}
