//! Optimistic edit buffer
//!
//! Holds the last confirmed remote items together with local edits that have
//! not been committed yet, and derives the list the user sees from both.
//!
//! ## Visible state
//!
//! ```text
//! visible = (confirmed ∪ pending additions) ∖ pending deletions
//! ```
//!
//! deduplicated by item ID, with the pending version winning over the
//! confirmed one. Confirmed items keep their snapshot order and pending
//! additions follow in insertion order.
//!
//! ## Dirty flag
//!
//! While local edits are pending the buffer is dirty and remote snapshots are
//! only stashed, never shown. A successful flush that leaves nothing pending
//! clears the flag and the next snapshot is adopted again.
//!
//! The buffer does no I/O. Flushing is split into [`EditBuffer::begin_flush`],
//! which hands out the batch to commit, and [`EditBuffer::complete_flush`],
//! which applies the commit result.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::models::{Item, ItemId};
use crate::store::{StoreError, WriteBatch};

/// Local edits not yet confirmed by the remote store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PendingEdits {
    /// Items created locally, in insertion order
    #[serde(default)]
    pub additions: Vec<Item>,
    /// IDs marked for removal
    #[serde(default)]
    pub deletions: BTreeSet<ItemId>,
}

impl PendingEdits {
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.deletions.is_empty()
    }

    fn contains_addition(&self, id: &ItemId) -> bool {
        self.additions.iter().any(|item| &item.id == id)
    }
}

/// Summary of a completed flush
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushOutcome {
    /// Number of items written
    pub upserted: usize,
    /// Number of items removed
    pub deleted: usize,
}

impl FlushOutcome {
    /// True when the flush had nothing to send
    pub fn is_noop(&self) -> bool {
        self.upserted == 0 && self.deleted == 0
    }
}

/// Errors produced when flushing pending edits
#[derive(Error, Debug)]
pub enum FlushError {
    /// Another flush has not finished yet
    #[error("A save is already in progress")]
    InProgress,

    /// A completion arrived with no flush outstanding
    #[error("No save is in progress")]
    NotInFlight,

    /// The remote store rejected the batch
    #[error("Failed to save: {0}")]
    Store(#[from] StoreError),
}

/// The edits handed out by the flush that is still outstanding
#[derive(Debug, Clone)]
struct InFlight {
    upserts: Vec<Item>,
    deletes: Vec<ItemId>,
}

impl InFlight {
    fn submitted(&self, id: &ItemId) -> bool {
        self.upserts.iter().any(|item| &item.id == id)
    }

    /// Whether a remote snapshot already contains the result of this flush
    fn is_reflected_in(&self, remote: &[Item]) -> bool {
        let remote_ids: HashSet<&ItemId> = remote.iter().map(|item| &item.id).collect();
        self.upserts.iter().all(|item| remote_ids.contains(&item.id))
            && self.deletes.iter().all(|id| !remote_ids.contains(id))
    }
}

/// The optimistic edit buffer
#[derive(Debug, Default)]
pub struct EditBuffer {
    confirmed: Vec<Item>,
    last_remote: Option<Vec<Item>>,
    /// `last_remote` arrived while dirty and has not been adopted
    remote_stashed: bool,
    remote_during_flush: bool,
    pending: PendingEdits,
    in_flight: Option<InFlight>,
    dirty: bool,
    visible: Vec<Item>,
}

impl EditBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer seeded with edits left over from an earlier session
    pub fn with_pending(pending: PendingEdits) -> Self {
        let mut buffer = Self::new();
        buffer.restore_pending(pending);
        buffer
    }

    /// Re-apply edits left over from an earlier session
    ///
    /// Restored deletions hide matching confirmed items. The buffer becomes
    /// dirty when anything was restored.
    pub fn restore_pending(&mut self, pending: PendingEdits) {
        if pending.is_empty() {
            return;
        }

        for item in pending.additions {
            match self.pending.additions.iter_mut().find(|a| a.id == item.id) {
                Some(existing) => *existing = item,
                None => self.pending.additions.push(item),
            }
        }
        for id in pending.deletions {
            self.confirmed.retain(|item| item.id != id);
            self.pending.deletions.insert(id);
        }

        self.dirty = true;
        self.recompute();
    }

    /// The list the user should see
    pub fn visible(&self) -> &[Item] {
        &self.visible
    }

    /// Items confirmed by the remote store
    pub fn confirmed(&self) -> &[Item] {
        &self.confirmed
    }

    /// The most recent remote snapshot, whether adopted or not
    pub fn last_remote(&self) -> Option<&[Item]> {
        self.last_remote.as_deref()
    }

    pub fn pending(&self) -> &PendingEdits {
        &self.pending
    }

    /// Whether unflushed local edits exist
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether a flush is outstanding
    pub fn is_flushing(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Queue a locally created item
    ///
    /// Re-adding an ID that is already pending replaces the earlier entry.
    pub fn add_pending(&mut self, item: Item) {
        self.pending.deletions.remove(&item.id);
        match self.pending.additions.iter_mut().find(|a| a.id == item.id) {
            Some(existing) => *existing = item,
            None => self.pending.additions.push(item),
        }
        self.dirty = true;
        self.recompute();
    }

    /// Mark an item for deletion
    ///
    /// A purely local addition that was never submitted is just cancelled and
    /// does not enter the deletion set.
    pub fn mark_pending_delete(&mut self, id: &ItemId) {
        let was_pending = self.pending.contains_addition(id);
        self.pending.additions.retain(|item| &item.id != id);

        let was_confirmed = self.confirmed.iter().any(|item| &item.id == id);
        self.confirmed.retain(|item| &item.id != id);

        let submitted = self
            .in_flight
            .as_ref()
            .is_some_and(|flight| flight.submitted(id));

        if was_pending && !was_confirmed && !submitted {
            debug!("Cancelled unsaved item {}", id);
        } else {
            self.pending.deletions.insert(id.clone());
        }

        self.dirty = true;
        self.recompute();
    }

    /// Offer a full remote snapshot
    ///
    /// Returns true when the snapshot was adopted as the confirmed state.
    pub fn apply_snapshot(&mut self, items: Vec<Item>) -> bool {
        if self.in_flight.is_some() {
            self.remote_during_flush = true;
        }

        if self.dirty {
            debug!(
                "Holding remote snapshot of {} item(s) until local edits are saved",
                items.len()
            );
            self.last_remote = Some(items);
            self.remote_stashed = true;
            return false;
        }

        self.last_remote = Some(items.clone());
        self.remote_stashed = false;
        self.confirmed = items;
        self.recompute();
        true
    }

    /// Start a flush of everything pending
    ///
    /// Returns `Ok(None)` when nothing is pending. The dirty flag is cleared
    /// and a snapshot held back while dirty is adopted, since nothing was
    /// committed in between.
    pub fn begin_flush(&mut self) -> Result<Option<WriteBatch>, FlushError> {
        if self.in_flight.is_some() {
            return Err(FlushError::InProgress);
        }

        if self.pending.is_empty() {
            self.dirty = false;
            if std::mem::take(&mut self.remote_stashed) {
                if let Some(remote) = &self.last_remote {
                    debug!("Adopting held snapshot of {} item(s)", remote.len());
                    self.confirmed = remote.clone();
                }
            }
            self.recompute();
            return Ok(None);
        }

        let flight = InFlight {
            upserts: self.pending.additions.clone(),
            deletes: self.pending.deletions.iter().cloned().collect(),
        };
        let batch = WriteBatch::from_items(&flight.upserts, flight.deletes.iter().cloned())?;
        self.in_flight = Some(flight);
        self.remote_during_flush = false;
        Ok(Some(batch))
    }

    /// Apply the result of the outstanding flush
    ///
    /// On success the flushed edits move into the confirmed state. On failure
    /// the pending edits are kept and the buffer stays dirty.
    pub fn complete_flush(
        &mut self,
        result: Result<(), StoreError>,
    ) -> Result<FlushOutcome, FlushError> {
        let flight = self.in_flight.take().ok_or(FlushError::NotInFlight)?;
        let remote_during_flush = std::mem::take(&mut self.remote_during_flush);

        if let Err(e) = result {
            self.dirty = true;
            return Err(FlushError::Store(e));
        }

        let deleted: HashSet<&ItemId> = flight.deletes.iter().collect();
        self.confirmed.retain(|item| !deleted.contains(&item.id));
        for item in &flight.upserts {
            match self.confirmed.iter_mut().find(|c| c.id == item.id) {
                Some(existing) => *existing = item.clone(),
                None => self.confirmed.push(item.clone()),
            }
        }

        // Entries replaced while the flush was running stay pending
        self.pending
            .additions
            .retain(|item| !flight.upserts.iter().any(|f| f.same_version(item)));
        self.pending.deletions.retain(|id| !deleted.contains(id));
        self.dirty = !self.pending.is_empty();
        // Anything held back predates the commit
        self.remote_stashed = false;

        // A snapshot taken after the commit landed is at least as fresh
        if !self.dirty && remote_during_flush {
            if let Some(remote) = &self.last_remote {
                if flight.is_reflected_in(remote) {
                    self.confirmed = remote.clone();
                }
            }
        }

        self.recompute();

        Ok(FlushOutcome {
            upserted: flight.upserts.len(),
            deleted: flight.deletes.len(),
        })
    }

    fn recompute(&mut self) {
        let pending = &self.pending;
        let shadowed: HashSet<&ItemId> = pending.additions.iter().map(|item| &item.id).collect();
        let mut seen: HashSet<ItemId> = HashSet::new();

        let confirmed = self
            .confirmed
            .iter()
            .filter(|item| !shadowed.contains(&item.id));

        self.visible = confirmed
            .chain(pending.additions.iter())
            .filter(|item| !pending.deletions.contains(&item.id))
            .filter(|item| seen.insert(item.id.clone()))
            .cloned()
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, name: &str) -> Item {
        Item::with_id(id.into(), name, 1.0, 1, "").unwrap()
    }

    fn ids(items: &[Item]) -> Vec<&str> {
        items.iter().map(|i| i.id.as_str()).collect()
    }

    fn assert_unique(items: &[Item]) {
        let mut seen = HashSet::new();
        for i in items {
            assert!(seen.insert(i.id.clone()), "duplicate id {}", i.id);
        }
    }

    fn confirmed_buffer(items: Vec<Item>) -> EditBuffer {
        let mut buffer = EditBuffer::new();
        assert!(buffer.apply_snapshot(items));
        buffer
    }

    #[test]
    fn test_new_buffer_is_clean() {
        let buffer = EditBuffer::new();
        assert!(!buffer.is_dirty());
        assert!(!buffer.is_flushing());
        assert!(buffer.visible().is_empty());
        assert!(buffer.last_remote().is_none());
    }

    #[test]
    fn test_add_pending_sets_dirty_and_shows_item() {
        let mut buffer = confirmed_buffer(vec![item("a", "Apples")]);
        buffer.add_pending(item("b", "Bread"));

        assert!(buffer.is_dirty());
        assert_eq!(ids(buffer.visible()), vec!["a", "b"]);
        assert_eq!(ids(buffer.confirmed()), vec!["a"]);
    }

    #[test]
    fn test_pending_addition_shadows_confirmed() {
        let mut buffer = confirmed_buffer(vec![item("a", "Apples"), item("b", "Bread")]);
        buffer.add_pending(item("a", "Green apples"));

        let visible = buffer.visible();
        assert_unique(visible);
        assert_eq!(ids(visible), vec!["b", "a"]);
        assert_eq!(visible[1].name, "Green apples");
    }

    #[test]
    fn test_readding_pending_id_replaces_entry() {
        let mut buffer = EditBuffer::new();
        buffer.add_pending(item("a", "Apples"));
        buffer.add_pending(item("b", "Bread"));
        buffer.add_pending(item("a", "Pears"));

        assert_eq!(buffer.pending().additions.len(), 2);
        assert_eq!(ids(buffer.visible()), vec!["a", "b"]);
        assert_eq!(buffer.visible()[0].name, "Pears");
    }

    #[test]
    fn test_visible_is_unique_for_mixed_sequences() {
        let mut buffer = confirmed_buffer(vec![item("a", "A"), item("b", "B"), item("c", "C")]);
        buffer.add_pending(item("b", "B2"));
        buffer.add_pending(item("d", "D"));
        buffer.mark_pending_delete(&"c".into());
        buffer.add_pending(item("d", "D2"));
        buffer.add_pending(item("e", "E"));
        buffer.mark_pending_delete(&"e".into());
        buffer.add_pending(item("a", "A2"));

        let visible = buffer.visible();
        assert_unique(visible);
        assert_eq!(ids(visible), vec!["b", "d", "a"]);
        assert!(visible.iter().all(|i| i.name.ends_with('2')));
    }

    #[test]
    fn test_delete_confirmed_item() {
        let mut buffer = confirmed_buffer(vec![item("a", "A"), item("c", "C")]);
        buffer.mark_pending_delete(&"c".into());

        assert!(buffer.is_dirty());
        assert_eq!(ids(buffer.visible()), vec!["a"]);
        assert_eq!(ids(buffer.confirmed()), vec!["a"]);
        assert!(buffer.pending().deletions.contains(&ItemId::from("c")));
    }

    #[test]
    fn test_delete_cancels_unflushed_add() {
        let mut buffer = EditBuffer::new();
        buffer.add_pending(item("x", "Eggs"));
        buffer.mark_pending_delete(&"x".into());

        assert!(buffer.visible().is_empty());
        assert!(!buffer.pending().contains_addition(&"x".into()));
        assert!(!buffer.pending().deletions.contains(&ItemId::from("x")));
    }

    #[test]
    fn test_delete_of_shadowing_addition_is_recorded() {
        let mut buffer = confirmed_buffer(vec![item("a", "A")]);
        buffer.add_pending(item("a", "A2"));
        buffer.mark_pending_delete(&"a".into());

        assert!(buffer.visible().is_empty());
        assert!(buffer.pending().additions.is_empty());
        assert!(buffer.pending().deletions.contains(&ItemId::from("a")));
    }

    #[test]
    fn test_successful_flush_updates_confirmed() {
        let mut buffer = confirmed_buffer(vec![item("c", "C"), item("d", "D")]);
        buffer.add_pending(item("a", "A"));
        buffer.add_pending(item("b", "B"));
        buffer.mark_pending_delete(&"c".into());

        let batch = buffer.begin_flush().unwrap().unwrap();
        assert_eq!(batch.upserts.len(), 2);
        assert_eq!(batch.deletes, vec![ItemId::from("c")]);
        assert!(buffer.is_flushing());

        let outcome = buffer.complete_flush(Ok(())).unwrap();
        assert_eq!(outcome, FlushOutcome { upserted: 2, deleted: 1 });

        assert_eq!(ids(buffer.confirmed()), vec!["d", "a", "b"]);
        assert!(buffer.pending().is_empty());
        assert!(!buffer.is_dirty());
        assert!(!buffer.is_flushing());
        assert_eq!(ids(buffer.visible()), vec!["d", "a", "b"]);
    }

    #[test]
    fn test_failed_flush_preserves_pending() {
        let mut buffer = confirmed_buffer(vec![item("c", "C")]);
        buffer.add_pending(item("a", "A"));
        buffer.mark_pending_delete(&"c".into());
        let before = buffer.pending().clone();
        let visible_before = buffer.visible().to_vec();

        buffer.begin_flush().unwrap().unwrap();
        let err = buffer
            .complete_flush(Err(StoreError::Rejected("permission denied".into())))
            .unwrap_err();

        assert!(matches!(err, FlushError::Store(_)));
        assert!(err.to_string().contains("permission denied"));
        assert_eq!(buffer.pending(), &before);
        assert_eq!(buffer.visible(), visible_before.as_slice());
        assert!(buffer.is_dirty());
        assert!(!buffer.is_flushing());

        // Retrying sends the same batch
        let retry = buffer.begin_flush().unwrap().unwrap();
        assert_eq!(retry.upserts.len(), 1);
        assert_eq!(retry.deletes, vec![ItemId::from("c")]);
    }

    #[test]
    fn test_concurrent_flush_is_rejected() {
        let mut buffer = EditBuffer::new();
        buffer.add_pending(item("a", "A"));
        buffer.begin_flush().unwrap().unwrap();

        assert!(matches!(buffer.begin_flush(), Err(FlushError::InProgress)));
    }

    #[test]
    fn test_complete_without_flush() {
        let mut buffer = EditBuffer::new();
        assert!(matches!(
            buffer.complete_flush(Ok(())),
            Err(FlushError::NotInFlight)
        ));
    }

    #[test]
    fn test_empty_flush_clears_dirty() {
        let mut buffer = confirmed_buffer(vec![item("a", "A")]);
        buffer.add_pending(item("x", "X"));
        buffer.mark_pending_delete(&"x".into());
        assert!(buffer.is_dirty());
        assert!(buffer.pending().is_empty());

        assert!(buffer.begin_flush().unwrap().is_none());
        assert!(!buffer.is_dirty());
        assert!(!buffer.is_flushing());
        assert_eq!(ids(buffer.confirmed()), vec!["a"]);
    }

    #[test]
    fn test_empty_flush_adopts_held_snapshot() {
        let mut buffer = confirmed_buffer(vec![item("a", "A")]);
        buffer.add_pending(item("x", "X"));
        assert!(!buffer.apply_snapshot(vec![item("a", "A"), item("r", "R")]));
        buffer.mark_pending_delete(&"x".into());
        assert_eq!(ids(buffer.visible()), vec!["a"]);

        assert!(buffer.begin_flush().unwrap().is_none());
        assert_eq!(ids(buffer.visible()), vec!["a", "r"]);
    }

    #[test]
    fn test_empty_flush_after_save_keeps_committed_state() {
        let mut buffer = confirmed_buffer(vec![item("a", "A")]);
        buffer.add_pending(item("b", "B"));
        // Held back, and older than the commit below
        buffer.apply_snapshot(vec![item("a", "A")]);
        buffer.begin_flush().unwrap().unwrap();
        buffer.complete_flush(Ok(())).unwrap();

        buffer.add_pending(item("x", "X"));
        buffer.mark_pending_delete(&"x".into());
        assert!(buffer.begin_flush().unwrap().is_none());
        assert_eq!(ids(buffer.visible()), vec!["a", "b"]);
    }

    #[test]
    fn test_snapshot_ignored_while_dirty() {
        let mut buffer = confirmed_buffer(vec![item("a", "A")]);
        buffer.add_pending(item("b", "B"));
        let before = buffer.visible().to_vec();

        assert!(!buffer.apply_snapshot(vec![item("z", "Z")]));
        assert_eq!(buffer.visible(), before.as_slice());
        assert_eq!(ids(buffer.last_remote().unwrap()), vec!["z"]);
    }

    #[test]
    fn test_snapshot_adopted_once_clean() {
        let mut buffer = confirmed_buffer(vec![item("a", "A")]);
        buffer.add_pending(item("b", "B"));
        buffer.apply_snapshot(vec![item("stale", "S")]);

        buffer.begin_flush().unwrap().unwrap();
        buffer.complete_flush(Ok(())).unwrap();
        assert!(!buffer.is_dirty());
        // The stale snapshot predates the flush, so the post-flush state shows
        assert_eq!(ids(buffer.visible()), vec!["a", "b"]);

        assert!(buffer.apply_snapshot(vec![item("a", "A"), item("b", "B"), item("c", "C")]));
        assert_eq!(ids(buffer.visible()), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_snapshot_during_flush_reflecting_commit_is_adopted() {
        let mut buffer = confirmed_buffer(vec![item("a", "A"), item("c", "C")]);
        buffer.add_pending(item("b", "B"));
        buffer.mark_pending_delete(&"c".into());
        buffer.begin_flush().unwrap().unwrap();

        // Another device added "z"; our commit already landed too
        assert!(!buffer.apply_snapshot(vec![item("a", "A"), item("b", "B"), item("z", "Z")]));

        buffer.complete_flush(Ok(())).unwrap();
        assert_eq!(ids(buffer.visible()), vec!["a", "b", "z"]);
    }

    #[test]
    fn test_snapshot_during_flush_missing_commit_is_not_adopted() {
        let mut buffer = confirmed_buffer(vec![item("a", "A")]);
        buffer.add_pending(item("b", "B"));
        buffer.begin_flush().unwrap().unwrap();

        buffer.apply_snapshot(vec![item("a", "A"), item("z", "Z")]);
        buffer.complete_flush(Ok(())).unwrap();

        assert_eq!(ids(buffer.visible()), vec!["a", "b"]);
    }

    #[test]
    fn test_edits_during_flush_stay_pending() {
        let mut buffer = confirmed_buffer(vec![item("a", "A")]);
        buffer.add_pending(item("b", "B"));
        buffer.begin_flush().unwrap().unwrap();

        buffer.add_pending(item("c", "C"));
        buffer.complete_flush(Ok(())).unwrap();

        assert!(buffer.is_dirty());
        assert_eq!(ids(&buffer.pending().additions), vec!["c"]);
        assert_eq!(ids(buffer.confirmed()), vec!["a", "b"]);
        assert_eq!(ids(buffer.visible()), vec!["a", "b", "c"]);

        // Still dirty, so snapshots stay hidden
        assert!(!buffer.apply_snapshot(vec![]));
    }

    #[test]
    fn test_replaced_addition_during_flush_stays_pending() {
        let mut buffer = EditBuffer::new();
        buffer.add_pending(item("a", "A"));
        buffer.begin_flush().unwrap().unwrap();

        buffer.add_pending(item("a", "A2"));
        buffer.complete_flush(Ok(())).unwrap();

        assert_eq!(buffer.pending().additions.len(), 1);
        assert_eq!(buffer.pending().additions[0].name, "A2");
        assert_eq!(buffer.confirmed()[0].name, "A");
        assert_eq!(buffer.visible()[0].name, "A2");
    }

    #[test]
    fn test_delete_of_submitted_addition_is_recorded() {
        let mut buffer = EditBuffer::new();
        buffer.add_pending(item("a", "A"));
        buffer.begin_flush().unwrap().unwrap();

        buffer.mark_pending_delete(&"a".into());
        assert!(buffer.pending().deletions.contains(&ItemId::from("a")));

        buffer.complete_flush(Ok(())).unwrap();
        assert!(buffer.visible().is_empty());
        assert!(buffer.is_dirty());

        let batch = buffer.begin_flush().unwrap().unwrap();
        assert_eq!(batch.deletes, vec![ItemId::from("a")]);
    }

    #[test]
    fn test_with_pending_restores_dirty_state() {
        let mut pending = PendingEdits::default();
        pending.additions.push(item("a", "A"));
        pending.deletions.insert("gone".into());

        let buffer = EditBuffer::with_pending(pending);
        assert!(buffer.is_dirty());
        assert_eq!(ids(buffer.visible()), vec!["a"]);
    }

    #[test]
    fn test_restore_after_first_snapshot() {
        let mut buffer = confirmed_buffer(vec![item("a", "A"), item("b", "B")]);
        let mut pending = PendingEdits::default();
        pending.additions.push(item("n", "N"));
        pending.deletions.insert("a".into());

        buffer.restore_pending(pending);
        assert!(buffer.is_dirty());
        assert_eq!(ids(buffer.visible()), vec!["b", "n"]);

        let batch = buffer.begin_flush().unwrap().unwrap();
        assert_eq!(batch.deletes, vec![ItemId::from("a")]);
    }

    #[test]
    fn test_restore_nothing_stays_clean() {
        let mut buffer = confirmed_buffer(vec![item("a", "A")]);
        buffer.restore_pending(PendingEdits::default());
        assert!(!buffer.is_dirty());
    }

    #[test]
    fn test_milk_without_image() {
        let mut buffer = EditBuffer::new();
        let milk = Item::new("Milk", 3.50, 2, "").unwrap();
        buffer.add_pending(milk);

        let visible = buffer.visible();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name, "Milk");
        assert_eq!(visible[0].budget, 3.50);
        assert_eq!(visible[0].priority, 2);
        assert_eq!(visible[0].image_url, "");
    }

    #[test]
    fn test_pending_edits_serialization() {
        let mut pending = PendingEdits::default();
        pending.additions.push(item("a", "A"));
        pending.deletions.insert("b".into());

        let json = serde_json::to_string(&pending).unwrap();
        let parsed: PendingEdits = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, pending);

        let empty: PendingEdits = serde_json::from_str("{}").unwrap();
        assert!(empty.is_empty());
    }
}
