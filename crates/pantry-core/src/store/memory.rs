//! In-memory document store
//!
//! Keeps the collection in a map and pushes a snapshot to every subscriber on
//! subscribe and after each commit. Failures can be injected so callers can
//! exercise their error paths.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

use super::{Document, DocumentStore, StoreError, StoreEvent, StoreResult, Subscription, WriteBatch};
use crate::models::{Item, ItemId};

#[derive(Debug, Default)]
struct MemoryInner {
    documents: BTreeMap<ItemId, Value>,
    subscribers: Vec<mpsc::UnboundedSender<StoreEvent>>,
    fail_next_commit: Option<String>,
    fail_subscriptions: Option<String>,
    commits: usize,
}

impl MemoryInner {
    fn snapshot(&self) -> Vec<Document> {
        self.documents
            .iter()
            .map(|(id, data)| Document::new(id.clone(), data.clone()))
            .collect()
    }

    fn publish(&mut self) {
        let snapshot = self.snapshot();
        self.subscribers
            .retain(|tx| tx.send(StoreEvent::Snapshot(snapshot.clone())).is_ok());
    }
}

/// Document store held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with items
    pub fn with_items<'a>(items: impl IntoIterator<Item = &'a Item>) -> StoreResult<Self> {
        let store = Self::new();
        {
            let mut inner = store.lock();
            for item in items {
                let doc = Document::from_item(item)?;
                inner.documents.insert(doc.id, doc.data);
            }
        }
        Ok(store)
    }

    /// Write a raw document outside of a batch and notify subscribers
    ///
    /// Useful for simulating another client or a malformed document.
    pub fn insert_raw(&self, id: impl Into<ItemId>, data: Value) {
        let mut inner = self.lock();
        inner.documents.insert(id.into(), data);
        inner.publish();
    }

    /// Make the next commit fail with the given message
    pub fn fail_next_commit(&self, message: impl Into<String>) {
        self.lock().fail_next_commit = Some(message.into());
    }

    /// Make subsequent subscribe calls fail
    pub fn fail_subscriptions(&self, message: impl Into<String>) {
        self.lock().fail_subscriptions = Some(message.into());
    }

    /// Send an error to every active subscriber and drop them
    pub fn break_subscriptions(&self, message: &str) {
        let mut inner = self.lock();
        for tx in inner.subscribers.drain(..) {
            let _ = tx.send(StoreEvent::Error(StoreError::Rejected(message.to_string())));
        }
    }

    /// Current contents of the collection
    pub fn documents(&self) -> Vec<Document> {
        self.lock().snapshot()
    }

    /// Decoded items, skipping anything malformed
    pub fn items(&self) -> Vec<Item> {
        self.documents()
            .iter()
            .filter_map(|doc| doc.decode().ok())
            .collect()
    }

    /// Number of successful commits
    pub fn commit_count(&self) -> usize {
        self.lock().commits
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        let mut inner = self.lock();
        inner.subscribers.retain(|tx| !tx.is_closed());
        inner.subscribers.len()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn subscribe(&self) -> StoreResult<Subscription> {
        let mut inner = self.lock();
        if let Some(ref message) = inner.fail_subscriptions {
            return Err(StoreError::Rejected(message.clone()));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(StoreEvent::Snapshot(inner.snapshot()));
        inner.subscribers.push(tx);
        Ok(rx)
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        let mut inner = self.lock();
        if let Some(message) = inner.fail_next_commit.take() {
            debug!("Rejecting batch of {} write(s): {}", batch.len(), message);
            return Err(StoreError::Rejected(message));
        }

        for doc in batch.upserts {
            inner.documents.insert(doc.id, doc.data);
        }
        for id in &batch.deletes {
            inner.documents.remove(id);
        }
        inner.commits += 1;
        inner.publish();
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(id: &str) -> Item {
        Item::with_id(id.into(), id.to_uppercase(), 1.0, 1, "").unwrap()
    }

    async fn next_snapshot(rx: &mut Subscription) -> Vec<Document> {
        match rx.recv().await {
            Some(StoreEvent::Snapshot(docs)) => docs,
            other => panic!("expected snapshot, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_subscribe_delivers_current_snapshot() {
        let store = MemoryStore::with_items([&item("a"), &item("b")]).unwrap();
        let mut rx = store.subscribe().await.unwrap();

        let docs = next_snapshot(&mut rx).await;
        assert_eq!(docs.len(), 2);
        assert_eq!(store.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_commit_applies_batch_and_notifies() {
        let store = MemoryStore::with_items([&item("a"), &item("c")]).unwrap();
        let mut rx = store.subscribe().await.unwrap();
        next_snapshot(&mut rx).await;

        let batch = WriteBatch::from_items([&item("b")], vec![ItemId::from("c")]).unwrap();
        store.commit(batch).await.unwrap();

        let ids: Vec<_> = next_snapshot(&mut rx)
            .await
            .into_iter()
            .map(|d| d.id.to_string())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(store.commit_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_commit_changes_nothing() {
        let store = MemoryStore::with_items([&item("a")]).unwrap();
        store.fail_next_commit("offline");

        let batch = WriteBatch::from_items([&item("b")], vec![ItemId::from("a")]).unwrap();
        let err = store.commit(batch.clone()).await.unwrap_err();
        assert!(err.to_string().contains("offline"));
        assert_eq!(store.items(), vec![item("a")]);
        assert_eq!(store.commit_count(), 0);

        // Only the next commit fails
        store.commit(batch).await.unwrap();
        assert_eq!(store.items(), vec![item("b")]);
    }

    #[tokio::test]
    async fn test_failing_subscriptions() {
        let store = MemoryStore::new();
        store.fail_subscriptions("no access");
        assert!(matches!(
            store.subscribe().await,
            Err(StoreError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn test_break_subscriptions_sends_error() {
        let store = MemoryStore::new();
        let mut rx = store.subscribe().await.unwrap();
        next_snapshot(&mut rx).await;

        store.break_subscriptions("lost connection");
        assert!(matches!(rx.recv().await, Some(StoreEvent::Error(_))));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_dropped_subscribers_are_pruned() {
        let store = MemoryStore::new();
        let rx = store.subscribe().await.unwrap();
        drop(rx);

        store.insert_raw("x", json!({"name": "X"}));
        assert_eq!(store.subscriber_count(), 0);
    }
}
