//! Pending edit journal
//!
//! Keeps unsaved edits on disk between sessions so an item added in one run
//! can be saved in a later one.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::buffer::PendingEdits;
use crate::store::atomic_write;

#[derive(Debug, Serialize, Deserialize)]
struct JournalFile {
    updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pending: PendingEdits,
}

/// Journal of pending edits stored as JSON
#[derive(Debug, Clone)]
pub struct PendingJournal {
    path: PathBuf,
}

impl PendingJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Load the pending edits; a missing journal means none
    pub fn load(&self) -> Result<PendingEdits> {
        Ok(self.read()?.map(|file| file.pending).unwrap_or_default())
    }

    /// When the journal was last written
    pub fn updated_at(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.read()?.map(|file| file.updated_at))
    }

    /// Save the pending edits, removing the journal when there are none
    pub fn save(&self, pending: &PendingEdits) -> Result<()> {
        if pending.is_empty() {
            return self.clear();
        }

        let file = JournalFile {
            updated_at: Utc::now(),
            pending: pending.clone(),
        };
        let json = serde_json::to_vec_pretty(&file).context("Failed to serialize journal")?;
        atomic_write(&self.path, &json)
            .with_context(|| format!("Failed to write journal {:?}", self.path))?;
        Ok(())
    }

    /// Write one session's changes into the journal as it is now
    ///
    /// `baseline` is what the session loaded (or last wrote) and `current`
    /// is what it holds now. Only the difference between the two is
    /// applied, so edits journaled by other sessions in the meantime are
    /// kept. Returns the journal contents after the update.
    pub fn update(&self, baseline: &PendingEdits, current: &PendingEdits) -> Result<PendingEdits> {
        let on_disk = self.load()?;
        if baseline == current {
            return Ok(on_disk);
        }

        let merged = merge(on_disk, baseline, current);
        self.save(&merged)?;
        Ok(merged)
    }

    /// Remove the journal
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("Failed to remove journal {:?}", self.path))?;
        }
        Ok(())
    }

    fn read(&self) -> Result<Option<JournalFile>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read journal {:?}", self.path))?;
        let file = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse journal {:?}", self.path))?;
        Ok(Some(file))
    }
}

fn merge(mut on_disk: PendingEdits, baseline: &PendingEdits, current: &PendingEdits) -> PendingEdits {
    // Saved or cancelled here; left alone if another session changed it
    for item in &baseline.additions {
        if !current.additions.iter().any(|c| c.id == item.id) {
            on_disk.additions.retain(|d| !d.same_version(item));
        }
    }

    for item in &current.additions {
        if baseline.additions.iter().any(|b| b.same_version(item)) {
            continue;
        }
        match on_disk.additions.iter_mut().find(|d| d.id == item.id) {
            Some(existing) => *existing = item.clone(),
            None => on_disk.additions.push(item.clone()),
        }
    }

    for id in baseline.deletions.difference(&current.deletions) {
        on_disk.deletions.remove(id);
    }
    for id in current.deletions.difference(&baseline.deletions) {
        on_disk.deletions.insert(id.clone());
    }

    on_disk
}
