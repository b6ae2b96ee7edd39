//! Document entity.

use chrono::{DateTime, Utc};
use domain::models::{Collection, Document, DocumentData};
use serde_json::Value as JsonValue;
use sqlx::FromRow;

/// Database row of the `documents` table.
#[derive(Debug, Clone, FromRow)]
pub struct DocumentEntity {
    pub collection: String,
    pub id: String,
    pub data: JsonValue,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DocumentEntity {
    /// Converts to the domain model. Rows with an unknown collection are skipped.
    pub fn into_domain(self) -> Option<Document> {
        let collection: Collection = self.collection.parse().ok()?;
        let data = match self.data {
            JsonValue::Object(map) => map,
            _ => DocumentData::new(),
        };
        Some(Document {
            id: self.id,
            collection,
            data,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entity(collection: &str, data: JsonValue) -> DocumentEntity {
        let now = Utc::now();
        DocumentEntity {
            collection: collection.to_string(),
            id: "svc-1".to_string(),
            data,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_into_domain() {
        let doc = entity("services", json!({"title": "Limpieza"}))
            .into_domain()
            .unwrap();
        assert_eq!(doc.collection, Collection::Services);
        assert_eq!(doc.data["title"], "Limpieza");
    }

    #[test]
    fn test_unknown_collection_skipped() {
        assert!(entity("users", json!({})).into_domain().is_none());
    }

    #[test]
    fn test_non_object_data_becomes_empty() {
        let doc = entity("gallery", json!([1, 2])).into_domain().unwrap();
        assert!(doc.data.is_empty());
    }
}
