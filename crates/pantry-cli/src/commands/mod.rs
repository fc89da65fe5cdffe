//! Command handlers
//!
//! Every command that touches the list runs inside a [`Session`]: the item
//! store and pending journal from the configuration, plus a list controller
//! seeded with the journaled edits.

pub mod config;
pub mod item;
pub mod save;
pub mod status;
pub mod watch;

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};
use tracing::debug;

use pantry_core::{
    Config, FileStore, Item, ListController, ListState, PendingEdits, PendingJournal,
};

/// An open list for the duration of one command
pub struct Session {
    controller: ListController,
    journal: PendingJournal,
    /// Pending edits as last read from or written to the journal
    baseline: Mutex<PendingEdits>,
    store: Arc<FileStore>,
}

impl Session {
    /// Open the configured store and restore journaled edits
    pub fn open(config: &Config) -> Result<Self> {
        config.ensure_data_dir()?;

        let store = Arc::new(
            FileStore::new(config.store_path()).with_poll_interval(config.poll_interval()),
        );
        let journal = PendingJournal::new(config.journal_path());
        let pending = journal
            .load()
            .context("Failed to load unsaved changes")?;
        debug!(
            "Opening {} with {} pending addition(s)",
            store.path().display(),
            pending.additions.len()
        );

        let baseline = Mutex::new(pending.clone());
        let controller = ListController::spawn(store.clone(), config.image_search(), pending);
        Ok(Self {
            controller,
            journal,
            baseline,
            store,
        })
    }

    pub fn controller(&self) -> &ListController {
        &self.controller
    }

    pub fn journal(&self) -> &PendingJournal {
        &self.journal
    }

    pub fn store_path(&self) -> &Path {
        self.store.path()
    }

    /// Wait for the first snapshot (or the listener failure)
    pub async fn load(&self) -> ListState {
        self.controller.loaded().await
    }

    /// The visible items; fails when the list could not be loaded
    pub async fn items(&self) -> Result<Vec<Item>> {
        match self.load().await {
            ListState::Ready(view) => Ok(view.items),
            ListState::LoadFailed(message) => bail!(message),
            ListState::Loading => bail!("List controller has stopped"),
        }
    }

    /// Record this session's edits in the journal
    ///
    /// Only what changed since the session opened (or last persisted) is
    /// written, so edits journaled by other invocations meanwhile survive.
    pub async fn persist(&self) -> Result<()> {
        let current = self.controller.pending().await?;
        let mut baseline = self.baseline.lock().unwrap_or_else(|e| e.into_inner());
        self.journal.update(&baseline, &current)?;
        *baseline = current;
        Ok(())
    }

    pub async fn close(self) {
        self.controller.shutdown().await;
    }
}
