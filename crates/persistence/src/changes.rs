//! Per-collection change notification channels.

use domain::models::{ChangeEvent, ChangeKind, Collection};
use domain::store::WATCH_CHANNEL_CAPACITY;
use std::collections::HashMap;
use tokio::sync::broadcast;

/// Fan-out of document mutations to watchers, one channel per collection.
#[derive(Debug)]
pub struct ChangeFeed {
    channels: HashMap<Collection, broadcast::Sender<ChangeEvent>>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::with_capacity(WATCH_CHANNEL_CAPACITY)
    }
}

impl ChangeFeed {
    pub fn with_capacity(capacity: usize) -> Self {
        let channels = Collection::ALL
            .iter()
            .map(|c| (*c, broadcast::channel(capacity).0))
            .collect();
        Self { channels }
    }

    pub fn subscribe(&self, collection: Collection) -> broadcast::Receiver<ChangeEvent> {
        match self.channels.get(&collection) {
            Some(tx) => tx.subscribe(),
            // Every collection gets a channel in the constructor.
            None => broadcast::channel(1).1,
        }
    }

    /// Notifies watchers. Having no watchers is not an error.
    pub fn publish(&self, collection: Collection, id: &str, kind: ChangeKind) {
        if let Some(tx) = self.channels.get(&collection) {
            let delivered = tx
                .send(ChangeEvent {
                    collection,
                    id: id.to_string(),
                    kind,
                })
                .unwrap_or(0);
            tracing::trace!(collection = %collection, id = %id, ?kind, delivered, "Change published");
        }
    }
}
