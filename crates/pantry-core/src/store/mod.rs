//! Remote document store
//!
//! The list lives in a collection of JSON documents keyed by item ID. A store
//! offers two things:
//!
//! - a live subscription that delivers full snapshots of the collection (or
//!   an error) on a channel
//! - an atomic batched write of upserts and deletes
//!
//! Implementations:
//!
//! - [`MemoryStore`]: in-process collection, with failure injection
//! - [`FileStore`]: JSON collection file with a polling watcher

mod error;
mod file;
mod memory;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::models::{Item, ItemError, ItemId};

pub use error::{StoreError, StoreResult};
pub use file::FileStore;
pub(crate) use file::atomic_write;
pub use memory::MemoryStore;

/// Why a document could not be turned into an item
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Malformed document: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Invalid item: {0}")]
    Invalid(#[from] ItemError),
}

/// A raw document from the collection
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Document key (the item ID)
    pub id: ItemId,
    /// Document body
    pub data: Value,
}

impl Document {
    pub fn new(id: impl Into<ItemId>, data: Value) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    /// Encode an item as a document keyed by its ID
    pub fn from_item(item: &Item) -> StoreResult<Self> {
        Ok(Self {
            id: item.id.clone(),
            data: serde_json::to_value(item)?,
        })
    }

    /// Decode the document into an item
    ///
    /// A body without an `id` takes the document key. The decoded item must
    /// pass the same field rules as a locally created one.
    pub fn decode(&self) -> Result<Item, DecodeError> {
        let mut item: Item = serde_json::from_value(self.data.clone())?;
        if item.id.is_empty() {
            item.id = self.id.clone();
        }
        item.validate()?;
        Ok(item)
    }
}

/// An all-or-nothing set of writes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    /// Documents to create or replace
    pub upserts: Vec<Document>,
    /// Document keys to remove
    pub deletes: Vec<ItemId>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a batch from items to write and IDs to remove
    pub fn from_items<'a>(
        upserts: impl IntoIterator<Item = &'a Item>,
        deletes: impl IntoIterator<Item = ItemId>,
    ) -> StoreResult<Self> {
        let upserts = upserts
            .into_iter()
            .map(Document::from_item)
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(Self {
            upserts,
            deletes: deletes.into_iter().collect(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.upserts.is_empty() && self.deletes.is_empty()
    }

    /// Total number of writes in the batch
    pub fn len(&self) -> usize {
        self.upserts.len() + self.deletes.len()
    }
}

/// Notifications delivered on a subscription
#[derive(Debug)]
pub enum StoreEvent {
    /// Full contents of the collection
    Snapshot(Vec<Document>),
    /// The subscription failed; no further events follow
    Error(StoreError),
}

/// Receiving end of a live subscription
pub type Subscription = mpsc::UnboundedReceiver<StoreEvent>;

/// A collection of item documents
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Open a live subscription
    ///
    /// The current snapshot is delivered first, followed by a new snapshot
    /// after every change. Dropping the receiver ends the subscription.
    async fn subscribe(&self) -> StoreResult<Subscription>;

    /// Apply a batch atomically
    async fn commit(&self, batch: WriteBatch) -> StoreResult<()>;

    /// Human-readable location of the store
    fn describe(&self) -> String;
}
