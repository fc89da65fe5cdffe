//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;

use pantry_core::models::MAX_PRIORITY;
use pantry_core::{Item, ListState, ListView};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print a single item
    pub fn print_item(&self, item: &Item) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:       {}", item.id);
                println!("Name:     {}", item.name);
                println!("Budget:   {:.2}", item.budget);
                println!("Priority: {}", stars(item.priority));
                if item.has_image() {
                    println!("Image:    {}", item.image_url);
                } else {
                    println!("Image:    (none)");
                }
            }
            OutputFormat::Json => print_json(item),
            OutputFormat::Quiet => println!("{}", item.id),
        }
    }

    /// Print a list of items
    pub fn print_items(&self, items: &[Item]) {
        match self.format {
            OutputFormat::Human => {
                if items.is_empty() {
                    println!("No items found.");
                    return;
                }
                for item in items {
                    println!(
                        "{:<8} | {:<30} | {:>8.2} | {} {}",
                        short_id(item),
                        truncate(&item.name, 30),
                        item.budget,
                        stars(item.priority),
                        if item.has_image() { "img" } else { "" }
                    );
                }
                let total: f64 = items.iter().map(|item| item.budget).sum();
                println!("\n{} item(s), total budget {:.2}", items.len(), total);
            }
            OutputFormat::Json => print_json(&items),
            OutputFormat::Quiet => {
                for item in items {
                    println!("{}", item.id);
                }
            }
        }
    }

    /// Print the visible list with its save status
    pub fn print_view(&self, view: &ListView) {
        match self.format {
            OutputFormat::Human => {
                self.print_items(&view.items);
                if view.saving {
                    println!("Saving...");
                } else if view.has_pending_changes {
                    println!("Unsaved changes. Run `pantry save` to save them.");
                }
                if let Some(ref error) = view.last_error {
                    println!("⚠ Last save failed: {}", error);
                }
            }
            OutputFormat::Json => print_json(&serde_json::json!({
                "items": view.items,
                "has_pending_changes": view.has_pending_changes,
                "saving": view.saving,
                "last_error": view.last_error
            })),
            OutputFormat::Quiet => self.print_items(&view.items),
        }
    }

    /// Print any list state (used by `watch`)
    pub fn print_state(&self, state: &ListState) {
        match state {
            ListState::Ready(view) => self.print_view(view),
            ListState::Loading => self.message("Loading..."),
            ListState::LoadFailed(message) => match self.format {
                OutputFormat::Json => print_json(&serde_json::json!({
                    "status": "error",
                    "message": message
                })),
                _ => eprintln!("⚠ {}", message),
            },
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a warning to stderr unless quiet
    pub fn warn(&self, msg: &str) {
        if !self.is_quiet() {
            eprintln!("⚠ {}", msg);
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to format output: {}", e),
    }
}

/// First eight characters of the item ID
pub fn short_id(item: &Item) -> String {
    item.id.as_str().chars().take(8).collect()
}

/// Priority as filled and empty stars, or "-" when unset
fn stars(priority: u8) -> String {
    if priority == 0 {
        return "-".to_string();
    }
    let filled = priority.min(MAX_PRIORITY) as usize;
    let empty = MAX_PRIORITY as usize - filled;
    format!("{}{}", "★".repeat(filled), "☆".repeat(empty))
}

/// Truncate a string to max length, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Human);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::Quiet);
        // Quiet takes precedence
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Quiet);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a long string", 10), "this is...");
        assert_eq!(truncate("crème fraîche épaisse", 8), "crème...");
    }

    #[test]
    fn test_stars() {
        assert_eq!(stars(0), "-");
        assert_eq!(stars(2), "★★☆☆☆");
        assert_eq!(stars(5), "★★★★★");
    }

    #[test]
    fn test_short_id() {
        let item = Item::with_id("0123456789abcdef".into(), "Milk", 3.5, 2, "").unwrap();
        assert_eq!(short_id(&item), "01234567");

        let item = Item::with_id("x".into(), "Milk", 3.5, 2, "").unwrap();
        assert_eq!(short_id(&item), "x");
    }
}
