//! Audit log domain models.
//!
//! Every content mutation and role change made through the admin surface
//! appends one entry. Entries are write-once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::str::FromStr;
use uuid::Uuid;

/// Default number of entries returned by a listing.
pub const DEFAULT_AUDIT_LIMIT: i64 = 100;

/// Upper bound on the number of entries returned by a listing.
pub const MAX_AUDIT_LIMIT: i64 = 500;

/// Audited actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    RoleChange,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "CREATE",
            AuditAction::Update => "UPDATE",
            AuditAction::Delete => "DELETE",
            AuditAction::RoleChange => "ROLE_CHANGE",
        }
    }
}

impl FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CREATE" => Ok(AuditAction::Create),
            "UPDATE" => Ok(AuditAction::Update),
            "DELETE" => Ok(AuditAction::Delete),
            "ROLE_CHANGE" => Ok(AuditAction::RoleChange),
            _ => Err(format!("Unknown audit action: {}", s)),
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Before/after value of a single changed field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldChange {
    pub before: Option<JsonValue>,
    pub after: Option<JsonValue>,
}

impl FieldChange {
    pub fn new(before: Option<JsonValue>, after: Option<JsonValue>) -> Self {
        Self { before, after }
    }
}

/// Recorded changes of an entry.
///
/// Creates record the written data as-is; updates record per-field diffs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AuditChanges {
    Diff(BTreeMap<String, FieldChange>),
    Data(JsonValue),
}

/// Audit log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: Uuid,
    pub action: AuditAction,
    #[serde(alias = "collectionName")]
    pub collection: String,
    pub document_id: String,
    pub user_id: String,
    pub user_email: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes: Option<AuditChanges>,
}

/// Input for appending an entry. The store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditEntry {
    pub action: AuditAction,
    pub collection: String,
    pub document_id: String,
    pub user_id: String,
    pub user_email: Option<String>,
    pub changes: Option<AuditChanges>,
}

impl NewAuditEntry {
    /// Stamps the entry with a fresh id and the current time.
    pub fn into_entry(self) -> AuditEntry {
        AuditEntry {
            id: Uuid::new_v4(),
            action: self.action,
            collection: self.collection,
            document_id: self.document_id,
            user_id: self.user_id,
            user_email: self.user_email,
            timestamp: Utc::now(),
            changes: self.changes,
        }
    }
}

/// Query parameters for listing audit entries, newest first.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAuditLogsQuery {
    #[serde(alias = "collectionName")]
    pub collection: Option<String>,
    pub document_id: Option<String>,
    pub user_id: Option<String>,
    pub action: Option<AuditAction>,
    pub limit: Option<i64>,
}

impl ListAuditLogsQuery {
    /// Effective limit, clamped to `1..=MAX_AUDIT_LIMIT`.
    pub fn effective_limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_AUDIT_LIMIT)
            .clamp(1, MAX_AUDIT_LIMIT)
    }

    /// Whether an entry passes the filters (limit not applied).
    pub fn matches(&self, entry: &AuditEntry) -> bool {
        self.collection
            .as_deref()
            .map_or(true, |c| entry.collection == c)
            && self
                .document_id
                .as_deref()
                .map_or(true, |d| entry.document_id == d)
            && self.user_id.as_deref().map_or(true, |u| entry.user_id == u)
            && self.action.map_or(true, |a| entry.action == a)
    }
}
