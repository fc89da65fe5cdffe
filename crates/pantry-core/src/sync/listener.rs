//! Listener implementation
//!
//! Snapshots are full replacements, never deltas. A document that fails to
//! decode is skipped without failing the rest of the snapshot. A subscription
//! error is terminal: it is reported once and the listener stops.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::models::Item;
use crate::store::{Document, DocumentStore, StoreError, StoreEvent};

/// Events delivered to the listener's sink
#[derive(Debug, Clone, PartialEq)]
pub enum ListenerEvent {
    /// Full contents of the remote collection
    Snapshot(Vec<Item>),
    /// The subscription failed; no further events follow
    Failed(String),
}

/// Decode a snapshot, skipping documents that are not valid items
pub fn decode_snapshot(documents: &[Document]) -> Vec<Item> {
    documents
        .iter()
        .filter_map(|doc| match doc.decode() {
            Ok(item) => Some(item),
            Err(e) => {
                warn!("Skipping undecodable document {}: {}", doc.id, e);
                None
            }
        })
        .collect()
}

/// Starts subscriptions to a document store
pub struct SyncListener;

impl SyncListener {
    /// Subscribe to `store` and forward events to `sink`
    ///
    /// The sink returns false once nobody is listening any more, which ends
    /// the subscription. The returned handle must be stopped (or dropped)
    /// to release the subscription.
    pub fn start<F>(store: Arc<dyn DocumentStore>, mut sink: F) -> SubscriptionHandle
    where
        F: FnMut(ListenerEvent) -> bool + Send + 'static,
    {
        let task = tokio::spawn(async move {
            let mut events = match store.subscribe().await {
                Ok(events) => events,
                Err(e) => {
                    warn!("Failed to subscribe to {}: {}", store.describe(), e);
                    sink(ListenerEvent::Failed(e.to_string()));
                    return;
                }
            };
            info!("Listening for changes in {}", store.describe());

            while let Some(event) = events.recv().await {
                match event {
                    StoreEvent::Snapshot(documents) => {
                        let items = decode_snapshot(&documents);
                        debug!(
                            "Received snapshot: {} item(s) from {} document(s)",
                            items.len(),
                            documents.len()
                        );
                        if !sink(ListenerEvent::Snapshot(items)) {
                            debug!("Listener sink closed, stopping");
                            return;
                        }
                    }
                    StoreEvent::Error(e) => {
                        warn!("Subscription to {} failed: {}", store.describe(), e);
                        sink(ListenerEvent::Failed(e.to_string()));
                        return;
                    }
                }
            }

            sink(ListenerEvent::Failed(StoreError::Closed.to_string()));
        });

        SubscriptionHandle { task: Some(task) }
    }
}

/// Handle to a running subscription
///
/// Dropping the handle stops the subscription as well.
#[derive(Debug)]
pub struct SubscriptionHandle {
    task: Option<JoinHandle<()>>,
}

impl SubscriptionHandle {
    /// Stop listening
    pub fn stop(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Whether the subscription is still delivering events
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Wait for the listener to end on its own (after a failure or once its
    /// sink closes)
    pub async fn finished(mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
