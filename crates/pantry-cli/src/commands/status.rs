//! Status command handler

use anyhow::Result;

use pantry_core::{Config, ListState};

use super::Session;
use crate::output::{Output, OutputFormat};

/// Show status information
pub async fn show(session: &Session, config: &Config, output: &Output) -> Result<()> {
    let state = session.load().await;
    let pending = session.controller().pending().await?;
    let journal_updated = session.journal().updated_at()?;
    let image_search = config.image_search.is_configured();

    let (item_count, load_error) = match &state {
        ListState::Ready(view) => (view.items.len(), None),
        ListState::LoadFailed(message) => (0, Some(message.as_str())),
        ListState::Loading => (0, None),
    };

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "store": session.store_path(),
                    "store_exists": session.store_path().exists(),
                    "items": item_count,
                    "load_error": load_error,
                    "pending": {
                        "additions": pending.additions.len(),
                        "deletions": pending.deletions.len(),
                        "updated_at": journal_updated.map(|t| t.to_rfc3339())
                    },
                    "image_search": image_search
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", pending.additions.len() + pending.deletions.len());
        }
        OutputFormat::Human => {
            println!("Pantry Status");
            println!("=============");
            println!();
            println!("Store:");
            println!("  Location: {}", session.store_path().display());
            match load_error {
                Some(message) => println!("  Status:   {}", message),
                None => println!("  Items:    {}", item_count),
            }
            println!();
            println!("Unsaved changes:");
            println!("  Additions: {}", pending.additions.len());
            println!("  Deletions: {}", pending.deletions.len());
            if let Some(updated) = journal_updated {
                println!("  Since:     {}", updated.format("%Y-%m-%d %H:%M"));
            }
            println!();
            println!(
                "Image search: {}",
                if image_search {
                    "configured"
                } else {
                    "not configured"
                }
            );
        }
    }

    Ok(())
}
