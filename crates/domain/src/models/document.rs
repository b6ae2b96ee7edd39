//! Generic content documents.
//!
//! Content lives in schemaless JSON documents grouped by collection. The
//! typed models (services, testimonials, gallery, settings) are views over
//! a document's `data` object.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::str::FromStr;

/// JSON object holding a document's fields.
pub type DocumentData = serde_json::Map<String, JsonValue>;

/// Field name of the published flag.
pub const PUBLISHED_FIELD: &str = "published";

/// Field name of the manual display order.
pub const ORDER_FIELD: &str = "order";

/// Content collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Services,
    Testimonials,
    Gallery,
    Settings,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Services,
        Collection::Testimonials,
        Collection::Gallery,
        Collection::Settings,
    ];

    /// Converts to storage string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Services => "services",
            Collection::Testimonials => "testimonials",
            Collection::Gallery => "gallery",
            Collection::Settings => "settings",
        }
    }
}

impl FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "services" => Ok(Collection::Services),
            "testimonials" => Ok(Collection::Testimonials),
            "gallery" => Ok(Collection::Gallery),
            "settings" => Ok(Collection::Settings),
            _ => Err(format!("Unknown collection: {}", s)),
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A stored document. Serializes as its data object plus `id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub id: String,
    #[serde(skip)]
    pub collection: Collection,
    #[serde(flatten)]
    pub data: DocumentData,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Whether the document is visible on the public site.
    pub fn is_published(&self) -> bool {
        self.data
            .get(PUBLISHED_FIELD)
            .and_then(JsonValue::as_bool)
            .unwrap_or(false)
    }

    /// Manual display order, if the document has one.
    pub fn order(&self) -> Option<i64> {
        self.data.get(ORDER_FIELD).and_then(|v| {
            v.as_i64()
                .or_else(|| v.as_f64().map(|f| f.round() as i64))
        })
    }

    /// Reads a boolean field.
    pub fn flag(&self, field: &str) -> Option<bool> {
        self.data.get(field).and_then(JsonValue::as_bool)
    }

    /// Returns the data object with `id` merged in.
    pub fn to_json(&self) -> JsonValue {
        let mut object = self.data.clone();
        object.insert("id".to_string(), JsonValue::String(self.id.clone()));
        JsonValue::Object(object)
    }
}

/// Filter applied when listing a collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub published_only: bool,
}

impl ListFilter {
    pub fn published_only() -> Self {
        Self {
            published_only: true,
        }
    }

    pub fn all() -> Self {
        Self::default()
    }

    /// Whether a document passes this filter.
    pub fn matches(&self, document: &Document) -> bool {
        !self.published_only || document.is_published()
    }
}

/// Sorts documents by their `order` field.
///
/// Stable: documents keep their incoming (creation) order among equals.
/// Documents without an order sort after all ordered ones.
pub fn sort_by_order(documents: &mut [Document]) {
    documents.sort_by_key(|d| d.order().unwrap_or(i64::MAX));
}

/// Kind of mutation delivered to watchers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

/// Notification that a document in a collection changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub collection: Collection,
    pub id: String,
    pub kind: ChangeKind,
}

/// Converts a serializable payload into a document data object.
///
/// `None` fields must be skipped by the payload's serde attributes; any
/// non-object payload yields an empty object.
pub fn to_document_data<T: Serialize>(payload: &T) -> Result<DocumentData, serde_json::Error> {
    match serde_json::to_value(payload)? {
        JsonValue::Object(map) => Ok(map),
        _ => Ok(DocumentData::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, data: JsonValue) -> Document {
        let now = Utc::now();
        Document {
            id: id.to_string(),
            collection: Collection::Services,
            data: data.as_object().cloned().unwrap_or_default(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_collection_round_trip_names() {
        for c in Collection::ALL {
            assert_eq!(c.as_str().parse::<Collection>().unwrap(), c);
        }
        assert!("users".parse::<Collection>().is_err());
        assert!("audit_logs".parse::<Collection>().is_err());
    }

    #[test]
    fn test_published_defaults_to_false() {
        assert!(!doc("a", json!({})).is_published());
        assert!(!doc("a", json!({"published": "yes"})).is_published());
        assert!(doc("a", json!({"published": true})).is_published());
    }

    #[test]
    fn test_order_accepts_integer_and_float() {
        assert_eq!(doc("a", json!({"order": 3})).order(), Some(3));
        assert_eq!(doc("a", json!({"order": 2.0})).order(), Some(2));
        assert_eq!(doc("a", json!({"order": "1"})).order(), None);
    }

    #[test]
    fn test_sort_by_order_is_stable_and_puts_unordered_last() {
        let mut docs = vec![
            doc("no-order-1", json!({})),
            doc("third", json!({"order": 3})),
            doc("first", json!({"order": 1})),
            doc("no-order-2", json!({})),
            doc("second-a", json!({"order": 2})),
            doc("second-b", json!({"order": 2})),
        ];
        sort_by_order(&mut docs);
        let ids: Vec<_> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["first", "second-a", "second-b", "third", "no-order-1", "no-order-2"]
        );
    }

    #[test]
    fn test_list_filter() {
        let draft = doc("d", json!({"published": false}));
        let live = doc("l", json!({"published": true}));
        assert!(ListFilter::all().matches(&draft));
        assert!(!ListFilter::published_only().matches(&draft));
        assert!(ListFilter::published_only().matches(&live));
    }

    #[test]
    fn test_document_serializes_flat_with_id() {
        let d = doc("svc-1", json!({"title": "Blanqueamiento", "order": 1}));
        let value = serde_json::to_value(&d).unwrap();
        assert_eq!(value["id"], "svc-1");
        assert_eq!(value["title"], "Blanqueamiento");
        assert!(value.get("collection").is_none());
        assert_eq!(value, d.to_json());
    }
}
