//! Pantry Core Library
//!
//! This crate provides the core functionality for Pantry, a shopping list
//! that keeps local edits visible while they are being saved to a shared
//! remote collection.
//!
//! # Architecture
//!
//! - **Edit buffer**: confirmed remote items plus pending local edits, with a
//!   dirty flag that holds remote snapshots back while edits are unsaved
//! - **Sync listener**: forwards snapshots from a [`DocumentStore`]
//! - **List controller**: a single task that owns the buffer and serializes
//!   every transition
//!
//! # Quick Start
//!
//! ```text
//! let store = Arc::new(FileStore::new(config.store_path()));
//! let controller = ListController::spawn(store, config.image_search(), PendingEdits::default());
//! controller.loaded().await;
//!
//! controller.add_item(ItemDraft::new("Milk", 3.5, 2)).await?;
//! controller.save().await?;
//! ```
//!
//! # Modules
//!
//! - `models`: Items and item drafts
//! - `buffer`: Optimistic edit buffer
//! - `store`: Remote document stores (file and in-memory)
//! - `sync`: Remote snapshot listener
//! - `images`: Image lookup for new items
//! - `controller`: List controller (main entry point)
//! - `journal`: Pending edits kept between sessions
//! - `config`: Application configuration

pub mod buffer;
pub mod config;
pub mod controller;
pub mod images;
pub mod journal;
pub mod models;
pub mod store;
pub mod sync;

pub use buffer::{EditBuffer, FlushError, FlushOutcome, PendingEdits};
pub use config::Config;
pub use controller::{ControllerError, ListController, ListState, ListView};
pub use images::{GoogleImageSearch, ImageSearch, NoImageSearch};
pub use journal::PendingJournal;
pub use models::{Item, ItemDraft, ItemError, ItemId};
pub use store::{DocumentStore, FileStore, MemoryStore, StoreError, WriteBatch};
pub use sync::{ListenerEvent, SubscriptionHandle, SyncListener};
