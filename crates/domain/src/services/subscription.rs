//! Live collection and document subscriptions.
//!
//! A subscription yields `Loading`, then the current state, then a fresh
//! state after every change in the watched collection until it is dropped.
//! The change channel is opened before the first read so no mutation
//! between the read and the first `recv` is lost.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::models::{ChangeEvent, Collection, Document, ListFilter};
use crate::store::DocumentStore;

/// State delivered by a collection subscription.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "data", rename_all = "snake_case")]
pub enum CollectionState {
    Loading,
    Snapshot(Vec<Document>),
    Error(String),
}

/// State delivered by a single-document subscription.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "data", rename_all = "snake_case")]
pub enum DocumentState {
    Loading,
    Document(Option<Document>),
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Loading,
    Initial,
    Live,
}

/// Outcome of waiting for the next relevant change.
enum Wake {
    Changed,
    Closed,
}

async fn wait_for_change<F>(rx: &mut broadcast::Receiver<ChangeEvent>, relevant: F) -> Wake
where
    F: Fn(&ChangeEvent) -> bool,
{
    loop {
        match rx.recv().await {
            Ok(event) if relevant(&event) => return Wake::Changed,
            Ok(_) => continue,
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "Subscription lagged, re-reading state");
                return Wake::Changed;
            }
            Err(RecvError::Closed) => return Wake::Closed,
        }
    }
}

/// Live view of a collection.
pub struct CollectionSubscription {
    store: Arc<dyn DocumentStore>,
    collection: Collection,
    filter: ListFilter,
    rx: broadcast::Receiver<ChangeEvent>,
    phase: Phase,
}

impl CollectionSubscription {
    pub fn new(store: Arc<dyn DocumentStore>, collection: Collection, published_only: bool) -> Self {
        let rx = store.watch(collection);
        Self {
            store,
            collection,
            filter: ListFilter { published_only },
            rx,
            phase: Phase::Loading,
        }
    }

    /// Next state, or `None` once the store stops publishing changes.
    pub async fn next(&mut self) -> Option<CollectionState> {
        match self.phase {
            Phase::Loading => {
                self.phase = Phase::Initial;
                return Some(CollectionState::Loading);
            }
            Phase::Initial => self.phase = Phase::Live,
            Phase::Live => {
                if let Wake::Closed = wait_for_change(&mut self.rx, |_| true).await {
                    return None;
                }
            }
        }
        Some(self.snapshot().await)
    }

    async fn snapshot(&self) -> CollectionState {
        match self.store.list(self.collection, self.filter).await {
            Ok(documents) => CollectionState::Snapshot(documents),
            Err(e) => {
                tracing::warn!(
                    collection = %self.collection,
                    error = %e,
                    "Subscription read failed"
                );
                CollectionState::Error(e.to_string())
            }
        }
    }
}

/// Live view of one document.
pub struct DocumentSubscription {
    store: Arc<dyn DocumentStore>,
    collection: Collection,
    id: String,
    published_only: bool,
    rx: broadcast::Receiver<ChangeEvent>,
    phase: Phase,
}

impl DocumentSubscription {
    /// With `published_only`, an unpublished document is delivered as `None`.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        collection: Collection,
        id: impl Into<String>,
        published_only: bool,
    ) -> Self {
        let rx = store.watch(collection);
        Self {
            store,
            collection,
            id: id.into(),
            published_only,
            rx,
            phase: Phase::Loading,
        }
    }

    pub async fn next(&mut self) -> Option<DocumentState> {
        match self.phase {
            Phase::Loading => {
                self.phase = Phase::Initial;
                return Some(DocumentState::Loading);
            }
            Phase::Initial => self.phase = Phase::Live,
            Phase::Live => {
                let id = self.id.clone();
                if let Wake::Closed = wait_for_change(&mut self.rx, |e| e.id == id).await {
                    return None;
                }
            }
        }
        Some(self.current().await)
    }

    async fn current(&self) -> DocumentState {
        match self.store.get(self.collection, &self.id).await {
            Ok(document) => DocumentState::Document(
                document.filter(|d| !self.published_only || d.is_published()),
            ),
            Err(e) => {
                tracing::warn!(
                    collection = %self.collection,
                    id = %self.id,
                    error = %e,
                    "Subscription read failed"
                );
                DocumentState::Error(e.to_string())
            }
        }
    }
}
