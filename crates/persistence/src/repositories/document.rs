//! Document repository backed by the `documents` table.

use async_trait::async_trait;
use domain::models::{
    sort_by_order, ChangeEvent, ChangeKind, Collection, Document, DocumentData, ListFilter,
};
use domain::store::{DocumentStore, StoreError};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::store_error;
use crate::changes::ChangeFeed;
use crate::entities::DocumentEntity;
use crate::metrics::QueryTimer;

const DOCUMENT_COLUMNS: &str = "collection, id, data, created_at, updated_at";

/// PostgreSQL document store.
///
/// Change notifications are published in-process after each committed
/// mutation, so watchers see writes made through this instance.
pub struct DocumentRepository {
    pool: PgPool,
    changes: ChangeFeed,
}

impl DocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            changes: ChangeFeed::default(),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn into_documents(rows: Vec<DocumentEntity>) -> Vec<Document> {
    rows.into_iter().filter_map(DocumentEntity::into_domain).collect()
}

#[async_trait]
impl DocumentStore for DocumentRepository {
    async fn list(
        &self,
        collection: Collection,
        filter: ListFilter,
    ) -> Result<Vec<Document>, StoreError> {
        let timer = QueryTimer::new("list_documents");
        let result = sqlx::query_as::<_, DocumentEntity>(&format!(
            r#"
            SELECT {DOCUMENT_COLUMNS}
            FROM documents
            WHERE collection = $1
              AND ($2 = false OR data -> 'published' = 'true'::jsonb)
            ORDER BY created_at, seq
            "#
        ))
        .bind(collection.as_str())
        .bind(filter.published_only)
        .fetch_all(&self.pool)
        .await;
        let rows = timer.finish(result).map_err(store_error)?;

        let mut documents = into_documents(rows);
        sort_by_order(&mut documents);
        Ok(documents)
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        let timer = QueryTimer::new("get_document");
        let result = sqlx::query_as::<_, DocumentEntity>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE collection = $1 AND id = $2"
        ))
        .bind(collection.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        let row = timer.finish(result).map_err(store_error)?;
        Ok(row.and_then(DocumentEntity::into_domain))
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
        let timer = QueryTimer::new("create_document");
        let result = sqlx::query_as::<_, DocumentEntity>(&format!(
            r#"
            INSERT INTO documents (collection, id, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id) DO NOTHING
            RETURNING {DOCUMENT_COLUMNS}
            "#
        ))
        .bind(collection.as_str())
        .bind(&id)
        .bind(JsonValue::Object(data))
        .fetch_optional(&self.pool)
        .await;
        let row = timer.finish(result).map_err(store_error)?;

        let document = row
            .and_then(DocumentEntity::into_domain)
            .ok_or_else(|| StoreError::Conflict(format!("{}/{}", collection, id)))?;
        self.changes.publish(collection, &document.id, ChangeKind::Created);
        Ok(document)
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: DocumentData,
    ) -> Result<Document, StoreError> {
        let timer = QueryTimer::new("update_document");
        // `||` on jsonb objects replaces top-level keys only.
        let result = sqlx::query_as::<_, DocumentEntity>(&format!(
            r#"
            UPDATE documents
            SET data = data || $3, updated_at = NOW()
            WHERE collection = $1 AND id = $2
            RETURNING {DOCUMENT_COLUMNS}
            "#
        ))
        .bind(collection.as_str())
        .bind(id)
        .bind(JsonValue::Object(patch))
        .fetch_optional(&self.pool)
        .await;
        let row = timer.finish(result).map_err(store_error)?;

        let document = row
            .and_then(DocumentEntity::into_domain)
            .ok_or_else(|| StoreError::NotFound(format!("{}/{}", collection, id)))?;
        self.changes.publish(collection, id, ChangeKind::Updated);
        Ok(document)
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, StoreError> {
        let timer = QueryTimer::new("delete_document");
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection.as_str())
            .bind(id)
            .execute(&self.pool)
            .await;
        let deleted = timer.finish(result).map_err(store_error)?.rows_affected() > 0;

        if deleted {
            self.changes.publish(collection, id, ChangeKind::Deleted);
        }
        Ok(deleted)
    }
}
