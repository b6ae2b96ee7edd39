//! Audit log entity.

use chrono::{DateTime, Utc};
use domain::models::{AuditAction, AuditChanges, AuditEntry};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row of the `audit_logs` table.
#[derive(Debug, Clone, FromRow)]
pub struct AuditLogEntity {
    pub id: Uuid,
    pub action: String,
    pub collection: String,
    pub document_id: String,
    pub user_id: String,
    pub user_email: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub changes: Option<JsonValue>,
}

impl AuditLogEntity {
    /// Converts to the domain model. Rows with an unknown action are skipped.
    pub fn into_domain(self) -> Option<AuditEntry> {
        let action: AuditAction = self.action.parse().ok()?;
        let changes = self.changes.map(|value| {
            serde_json::from_value::<AuditChanges>(value.clone())
                .unwrap_or(AuditChanges::Data(value))
        });
        Some(AuditEntry {
            id: self.id,
            action,
            collection: self.collection,
            document_id: self.document_id,
            user_id: self.user_id,
            user_email: self.user_email,
            timestamp: self.timestamp,
            changes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_audit_entity_to_domain() {
        let entity = AuditLogEntity {
            id: Uuid::new_v4(),
            action: "UPDATE".to_string(),
            collection: "services".to_string(),
            document_id: "svc-1".to_string(),
            user_id: "uid-1".to_string(),
            user_email: Some("admin@clinic.test".to_string()),
            timestamp: Utc::now(),
            changes: Some(json!({"title": {"before": "A", "after": "B"}})),
        };
        let entry = entity.into_domain().unwrap();
        assert_eq!(entry.action, AuditAction::Update);
        assert!(matches!(entry.changes, Some(AuditChanges::Diff(_))));
    }

    #[test]
    fn test_unknown_action_skipped() {
        let entity = AuditLogEntity {
            id: Uuid::new_v4(),
            action: "PUBLISH".to_string(),
            collection: "services".to_string(),
            document_id: "x".to_string(),
            user_id: "u".to_string(),
            user_email: None,
            timestamp: Utc::now(),
            changes: None,
        };
        assert!(entity.into_domain().is_none());
    }
}
