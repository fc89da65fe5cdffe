//! JSON file document store
//!
//! The collection is a single JSON object mapping item IDs to documents:
//!
//! ```json
//! { "3f2a...": { "id": "3f2a...", "name": "Milk", "budget": 3.5, ... } }
//! ```
//!
//! A commit reads the file, applies the batch and replaces the file with an
//! atomic write, so a batch lands completely or not at all. Subscribers poll
//! the file and receive a snapshot whenever its contents change.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use super::{Document, DocumentStore, StoreError, StoreEvent, StoreResult, Subscription, WriteBatch};
use crate::models::ItemId;

/// Default polling interval for subscriptions
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

type Collection = BTreeMap<String, Value>;

/// Document store backed by a JSON file
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    poll_interval: Duration,
    write_lock: Arc<Mutex<()>>,
}

impl FileStore {
    /// Create a store for the collection file at `path`
    ///
    /// The file is created on the first commit.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Set how often subscriptions check the file for changes
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Read the raw documents currently in the file
    pub fn read_documents(&self) -> StoreResult<Vec<Document>> {
        let bytes = read_bytes(&self.path)?;
        parse_collection(&self.path, bytes.as_deref()).map(into_documents)
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn subscribe(&self) -> StoreResult<Subscription> {
        let path = self.path.clone();
        let interval = self.poll_interval;

        let bytes = read_bytes(&path)?;
        let initial = parse_collection(&path, bytes.as_deref())?;

        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(StoreEvent::Snapshot(into_documents(initial)));
        info!("Watching {:?} every {:?}", path, interval);

        tokio::spawn(async move {
            let mut last_seen = bytes;
            loop {
                tokio::time::sleep(interval).await;
                if tx.is_closed() {
                    debug!("Subscription to {:?} dropped", path);
                    break;
                }

                let current = match read_bytes(&path) {
                    Ok(current) => current,
                    Err(e) => {
                        warn!("Watch of {:?} failed: {}", path, e);
                        let _ = tx.send(StoreEvent::Error(e));
                        break;
                    }
                };
                if current == last_seen {
                    continue;
                }

                match parse_collection(&path, current.as_deref()) {
                    Ok(collection) => {
                        debug!("{:?} changed, {} document(s)", path, collection.len());
                        if tx.send(StoreEvent::Snapshot(into_documents(collection))).is_err() {
                            break;
                        }
                        last_seen = current;
                    }
                    Err(e) => {
                        warn!("Watch of {:?} failed: {}", path, e);
                        let _ = tx.send(StoreEvent::Error(e));
                        break;
                    }
                }
            }
        });

        Ok(rx)
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || apply_batch(&path, batch))
            .await
            .map_err(|e| StoreError::Background(e.to_string()))?
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Read-modify-write the collection file
fn apply_batch(path: &Path, batch: WriteBatch) -> StoreResult<()> {
    let bytes = read_bytes(path)?;
    let mut collection = parse_collection(path, bytes.as_deref())?;

    let upserts = batch.upserts.len();
    for doc in batch.upserts {
        collection.insert(doc.id.to_string(), doc.data);
    }
    for id in &batch.deletes {
        collection.remove(id.as_str());
    }

    let data = serde_json::to_vec_pretty(&collection)?;
    atomic_write(path, &data)?;
    debug!(
        "Committed {} upsert(s) and {} delete(s) to {:?}",
        upserts,
        batch.deletes.len(),
        path
    );
    Ok(())
}

/// Read the file, treating a missing file as absent
fn read_bytes(path: &Path) -> StoreResult<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            Err(StoreError::from_io(e, path.to_path_buf()))
        }
        Err(e) => Err(StoreError::ReadError {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

fn parse_collection(path: &Path, bytes: Option<&[u8]>) -> StoreResult<Collection> {
    let Some(bytes) = bytes else {
        return Ok(Collection::new());
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Collection::new());
    }

    serde_json::from_slice(bytes).map_err(|e| StoreError::InvalidFormat {
        path: path.to_path_buf(),
        details: e.to_string(),
    })
}

fn into_documents(collection: Collection) -> Vec<Document> {
    collection
        .into_iter()
        .map(|(id, data)| Document::new(ItemId::from(id), data))
        .collect()
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
pub(crate) fn atomic_write(path: &Path, data: &[u8]) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| StoreError::from_io(e, parent.to_path_buf()))?;
        }
    }

    let temp_path = path.with_extension("tmp");

    let mut file =
        File::create(&temp_path).map_err(|e| StoreError::from_io(e, temp_path.clone()))?;
    file.write_all(data)
        .map_err(|e| StoreError::from_io(e, temp_path.clone()))?;
    file.sync_all()
        .map_err(|e| StoreError::from_io(e, temp_path.clone()))?;

    fs::rename(&temp_path, path).map_err(|e| StoreError::AtomicWriteFailed {
        from: temp_path.clone(),
        to: path.to_path_buf(),
        source: e,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Item;
    use tempfile::TempDir;

    fn item(id: &str) -> Item {
        Item::with_id(id.into(), id.to_uppercase(), 2.5, 3, "").unwrap()
    }

    fn store(temp_dir: &TempDir) -> FileStore {
        FileStore::new(temp_dir.path().join("items.json"))
            .with_poll_interval(Duration::from_millis(20))
    }

    async fn next_snapshot(rx: &mut Subscription) -> Vec<Document> {
        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for snapshot");
        match event {
            Some(StoreEvent::Snapshot(docs)) => docs,
            other => panic!("expected snapshot, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_collection() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        assert!(store.read_documents().unwrap().is_empty());
        let mut rx = store.subscribe().await.unwrap();
        assert!(next_snapshot(&mut rx).await.is_empty());
    }

    #[tokio::test]
    async fn test_commit_creates_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        let batch = WriteBatch::from_items([&item("a"), &item("b")], vec![]).unwrap();
        store.commit(batch).await.unwrap();

        assert!(store.path().exists());
        let docs = store.read_documents().unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].decode().unwrap(), item("a"));
    }

    #[tokio::test]
    async fn test_commit_upserts_and_deletes() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        store
            .commit(WriteBatch::from_items([&item("a"), &item("c")], vec![]).unwrap())
            .await
            .unwrap();

        let batch = WriteBatch::from_items([&item("b")], vec![ItemId::from("c")]).unwrap();
        store.commit(batch).await.unwrap();

        let ids: Vec<_> = store
            .read_documents()
            .unwrap()
            .into_iter()
            .map(|d| d.id.to_string())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_subscription_sees_commits() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        let mut rx = store.subscribe().await.unwrap();
        assert!(next_snapshot(&mut rx).await.is_empty());

        store
            .commit(WriteBatch::from_items([&item("a")], vec![]).unwrap())
            .await
            .unwrap();

        let docs = next_snapshot(&mut rx).await;
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id.as_str(), "a");
    }

    #[tokio::test]
    async fn test_corrupt_file_fails_subscription() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        fs::write(store.path(), "{ not json").unwrap();

        let err = store.subscribe().await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidFormat { .. }));
    }

    #[tokio::test]
    async fn test_corruption_while_watching_sends_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        let mut rx = store.subscribe().await.unwrap();
        next_snapshot(&mut rx).await;

        fs::write(store.path(), "[1, 2").unwrap();

        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap();
        assert!(matches!(event, Some(StoreEvent::Error(_))));
    }

    #[tokio::test]
    async fn test_corrupt_file_rejects_commit() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        fs::write(store.path(), "garbage").unwrap();

        let batch = WriteBatch::from_items([&item("a")], vec![]).unwrap();
        assert!(store.commit(batch).await.is_err());
        // File untouched
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "garbage");
    }

    #[test]
    fn test_atomic_write_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let nested_path = temp_dir.path().join("a").join("b").join("items.json");

        atomic_write(&nested_path, b"{}").unwrap();

        assert!(nested_path.exists());
        assert_eq!(fs::read_to_string(&nested_path).unwrap(), "{}");
        assert!(!nested_path.with_extension("tmp").exists());
    }
}
