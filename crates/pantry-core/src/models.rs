//! Data models for Pantry
//!
//! Defines the list entry (`Item`), its identifier, and the user-supplied
//! `ItemDraft` an item is built from. Items serialize to the document shape
//! stored in the remote collection.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Highest allowed priority rating
pub const MAX_PRIORITY: u8 = 5;

/// Opaque, immutable item identifier
///
/// The identifier is the only key used for equality, deduplication and
/// deletion targeting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A single shopping list entry
///
/// Missing document fields fall back to their defaults when decoding.
///
/// `==` compares every field. Use `id` for identity and
/// [`Item::same_version`] to ask whether two values are the same edit.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Item {
    /// Unique identifier
    pub id: ItemId,
    /// Display name
    pub name: String,
    /// Budget for this item (non-negative)
    pub budget: f64,
    /// Priority rating 1-5, 0 means unset
    pub priority: u8,
    /// Image URL, empty when no image was found
    #[serde(rename = "imageUrl")]
    pub image_url: String,
}

impl Item {
    /// Create an item with a freshly generated ID, validating the fields
    pub fn new(
        name: impl Into<String>,
        budget: f64,
        priority: u8,
        image_url: impl Into<String>,
    ) -> Result<Self, ItemError> {
        Self::with_id(ItemId::generate(), name, budget, priority, image_url)
    }

    /// Create an item with a specific ID
    pub fn with_id(
        id: ItemId,
        name: impl Into<String>,
        budget: f64,
        priority: u8,
        image_url: impl Into<String>,
    ) -> Result<Self, ItemError> {
        if id.is_empty() {
            return Err(ItemError::EmptyId);
        }
        let name = name.into();
        validate_fields(&name, budget, priority)?;
        Ok(Self {
            id,
            name: name.trim().to_string(),
            budget,
            priority,
            image_url: image_url.into(),
        })
    }

    /// Whether an image reference is present
    pub fn has_image(&self) -> bool {
        !self.image_url.is_empty()
    }

    /// Check the field rules on an item that did not come through a
    /// constructor, such as one decoded from a remote document
    pub fn validate(&self) -> Result<(), ItemError> {
        if self.id.is_empty() {
            return Err(ItemError::EmptyId);
        }
        validate_fields(&self.name, self.budget, self.priority)
    }

    /// Same identifier and same field values
    pub fn same_version(&self, other: &Item) -> bool {
        self == other
    }
}

/// User input for a new item, before enrichment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDraft {
    pub name: String,
    pub budget: f64,
    pub priority: u8,
}

impl ItemDraft {
    pub fn new(name: impl Into<String>, budget: f64, priority: u8) -> Self {
        Self {
            name: name.into(),
            budget,
            priority,
        }
    }

    /// Check the draft without building an item
    pub fn validate(&self) -> Result<(), ItemError> {
        validate_fields(&self.name, self.budget, self.priority)
    }

    /// The text used for the image lookup
    pub fn search_query(&self) -> &str {
        self.name.trim()
    }

    /// Build the item, attaching the resolved image reference
    pub fn into_item(self, image_url: impl Into<String>) -> Result<Item, ItemError> {
        Item::new(self.name, self.budget, self.priority, image_url)
    }
}

/// Validation errors for items
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ItemError {
    #[error("Item name must not be empty")]
    EmptyName,

    #[error("Item identifier must not be empty")]
    EmptyId,

    #[error("Budget must be a non-negative number, got {0}")]
    InvalidBudget(f64),

    #[error("Priority must be between 0 and {max}, got {0}", max = MAX_PRIORITY)]
    InvalidPriority(u8),
}

fn validate_fields(name: &str, budget: f64, priority: u8) -> Result<(), ItemError> {
    if name.trim().is_empty() {
        return Err(ItemError::EmptyName);
    }
    if !budget.is_finite() || budget < 0.0 {
        return Err(ItemError::InvalidBudget(budget));
    }
    if priority > MAX_PRIORITY {
        return Err(ItemError::InvalidPriority(priority));
    }
    Ok(())
}
