//! Watch command handler

use anyhow::Result;
use tracing::debug;

use super::Session;
use crate::output::{Output, OutputFormat};

/// Print the list every time it changes, until Ctrl-C
///
/// Read-only: the journal is never written, so edits made by other
/// invocations while watching stay journaled.
pub async fn watch(session: &Session, output: &Output) -> Result<()> {
    let mut updates = session.controller().subscribe();
    let initial = updates.borrow_and_update().clone();
    output.print_state(&initial);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                debug!("Interrupted, stopping watch");
                break;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                if output.format == OutputFormat::Human {
                    println!();
                }
                output.print_state(&state);
            }
        }
    }

    Ok(())
}
