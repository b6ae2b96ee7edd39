//! Audit log repository for database operations.

use async_trait::async_trait;
use domain::models::{AuditEntry, ListAuditLogsQuery, NewAuditEntry};
use domain::store::{AuditLogStore, StoreError};
use sqlx::PgPool;

use super::store_error;
use crate::entities::AuditLogEntity;
use crate::metrics::QueryTimer;

/// Repository for audit log entries.
#[derive(Clone)]
pub struct AuditLogRepository {
    pool: PgPool,
}

impl AuditLogRepository {
    /// Create a new repository instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditLogStore for AuditLogRepository {
    async fn append(&self, entry: NewAuditEntry) -> Result<AuditEntry, StoreError> {
        let entry = entry.into_entry();
        let changes = entry
            .changes
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let timer = QueryTimer::new("insert_audit_log");
        let result = sqlx::query(
            r#"
            INSERT INTO audit_logs (id, action, collection, document_id, user_id, user_email, timestamp, changes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(entry.id)
        .bind(entry.action.as_str())
        .bind(&entry.collection)
        .bind(&entry.document_id)
        .bind(&entry.user_id)
        .bind(&entry.user_email)
        .bind(entry.timestamp)
        .bind(changes)
        .execute(&self.pool)
        .await;
        timer.finish(result).map_err(store_error)?;

        Ok(entry)
    }

    async fn list(&self, query: &ListAuditLogsQuery) -> Result<Vec<AuditEntry>, StoreError> {
        let timer = QueryTimer::new("list_audit_logs");
        let result = sqlx::query_as::<_, AuditLogEntity>(
            r#"
            SELECT id, action, collection, document_id, user_id, user_email, timestamp, changes
            FROM audit_logs
            WHERE ($1::text IS NULL OR collection = $1)
              AND ($2::text IS NULL OR document_id = $2)
              AND ($3::text IS NULL OR user_id = $3)
              AND ($4::text IS NULL OR action = $4)
            ORDER BY timestamp DESC
            LIMIT $5
            "#,
        )
        .bind(&query.collection)
        .bind(&query.document_id)
        .bind(&query.user_id)
        .bind(query.action.map(|a| a.as_str()))
        .bind(query.effective_limit())
        .fetch_all(&self.pool)
        .await;

        Ok(timer
            .finish(result)
            .map_err(store_error)?
            .into_iter()
            .filter_map(AuditLogEntity::into_domain)
            .collect())
    }
}
