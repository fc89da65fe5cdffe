//! Remote sync listener
//!
//! Keeps a live subscription to the document store and turns every
//! notification into a full list of items for the edit buffer.
//!
//! ## Usage
//!
//! ```ignore
//! let handle = SyncListener::start(store, move |event| tx.send(event).is_ok());
//! // ...
//! handle.stop();
//! ```

mod listener;

pub use listener::{decode_snapshot, ListenerEvent, SubscriptionHandle, SyncListener};
