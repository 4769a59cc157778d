//! Catalog item types.

use serde::{Deserialize, Serialize};

use thimble_core::{Cents, ItemId, UserId};

/// A catalog item.
#[derive(Debug, Clone, Serialize)]
pub struct Item {
    /// Unique item ID.
    pub id: ItemId,
    pub title: String,
    pub description: String,
    /// Thumbnail image reference.
    pub image: Option<String>,
    /// Full-size image reference.
    pub large_image: Option<String>,
    /// Price in the smallest currency unit.
    pub price: Cents,
    /// The user who listed this item.
    pub user_id: UserId,
}

/// Fields for creating a new item. The owner is always the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemDraft {
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub large_image: Option<String>,
    pub price: Cents,
}

/// Partial update for an item. The ID is never updatable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub large_image: Option<String>,
    pub price: Option<Cents>,
}
