//! Item command handlers

use anyhow::{bail, Result};

use pantry_core::{Item, ItemDraft, ItemId, ListState};

use super::Session;
use crate::output::{short_id, Output};

/// Add an item to the pending edits
pub async fn add(
    session: &Session,
    name: String,
    budget: f64,
    priority: u8,
    output: &Output,
) -> Result<()> {
    if let ListState::LoadFailed(message) = session.load().await {
        output.warn(&message);
    }

    let item = session
        .controller()
        .add_item(ItemDraft::new(name, budget, priority))
        .await?;
    session.persist().await?;

    if output.is_quiet() || output.is_json() {
        output.print_item(&item);
    } else {
        output.success(&format!("Added: {} ({})", item.name, short_id(&item)));
        if !item.has_image() {
            output.message("  No image found");
        }
        output.message("Run `pantry save` to save it.");
    }

    Ok(())
}

/// Mark an item for deletion
pub async fn remove(session: &Session, id: String, output: &Output) -> Result<()> {
    let items = session.items().await?;
    let item = resolve_item(&items, &id)?;

    session.controller().delete_item(&item.id).await?;
    session.persist().await?;

    output.success(&format!("Removed: {}", item.name));
    Ok(())
}

/// List the visible items
pub async fn list(session: &Session, output: &Output) -> Result<()> {
    match session.load().await {
        ListState::Ready(view) => {
            output.print_view(&view);
            Ok(())
        }
        ListState::LoadFailed(message) => bail!(message),
        ListState::Loading => bail!("List controller has stopped"),
    }
}

/// Find an item by full ID or ID prefix
fn resolve_item(items: &[Item], id: &str) -> Result<Item> {
    let id = id.trim();
    if id.is_empty() {
        bail!("Item ID is required");
    }

    let exact = ItemId::from(id);
    if let Some(item) = items.iter().find(|item| item.id == exact) {
        return Ok(item.clone());
    }

    // Try prefix match
    let matches: Vec<_> = items
        .iter()
        .filter(|item| item.id.as_str().starts_with(id))
        .collect();

    match matches.len() {
        0 => bail!("No item found matching: {}", id),
        1 => Ok(matches[0].clone()),
        _ => {
            eprintln!("Multiple items match '{}':", id);
            for item in &matches {
                eprintln!("  {} - {}", item.id, item.name);
            }
            bail!("Ambiguous ID. Please provide more characters.");
        }
    }
}
