//! Save command handler

use anyhow::{Context, Result};

use pantry_core::{ControllerError, FlushError};

use super::Session;
use crate::output::Output;

/// Flush pending edits to the store
///
/// The journal is rewritten either way: cleared after a successful save,
/// kept as it was after a failed one.
pub async fn save(session: &Session, output: &Output) -> Result<()> {
    session.load().await;

    let result = session.controller().save().await;
    session.persist().await?;

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            if let Some(hint) = recovery_hint(&e) {
                output.warn(hint);
            }
            return Err(e).context("Unsaved changes were kept");
        }
    };

    if outcome.is_noop() {
        output.message("Nothing to save.");
    } else {
        output.success(&format!(
            "Saved {} item(s), removed {} to {}",
            outcome.upserted,
            outcome.deleted,
            session.store_path().display()
        ));
    }

    Ok(())
}

/// What the user can do about a failed save, if the store knows
fn recovery_hint(error: &ControllerError) -> Option<&'static str> {
    match error {
        ControllerError::Flush(FlushError::Store(e)) => e.recovery_suggestion(),
        _ => None,
    }
}
