//! Order domain types.
//!
//! Orders are immutable once created. Their line items are denormalized
//! snapshots of the purchased items - later catalog edits or deletions never
//! change what a historical order says was bought.

use chrono::{DateTime, Utc};
use serde::Serialize;

use thimble_core::{Cents, OrderId, OrderItemId, UserId};

use super::CartEntry;

/// A paid, immutable order.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    /// Unique order ID.
    pub id: OrderId,
    /// The amount the gateway reports it charged - not the locally
    /// computed cart total.
    pub total: Cents,
    /// External payment charge ID.
    pub charge_id: String,
    /// Purchased item snapshots.
    pub items: Vec<OrderItem>,
    /// The user who placed the order.
    pub user_id: UserId,
    /// When the order was placed.
    pub created_at: DateTime<Utc>,
}

/// A snapshot of one purchased item.
///
/// Carries a copy of the item's fields with no reference back to the live
/// catalog row.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub large_image: Option<String>,
    /// Unit price at purchase time.
    pub price: Cents,
    pub quantity: i32,
}

/// An order item snapshot before it has been persisted.
#[derive(Debug, Clone)]
pub struct OrderItemDraft {
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub large_image: Option<String>,
    pub price: Cents,
    pub quantity: i32,
}

impl OrderItemDraft {
    /// Snapshot a cart entry, stripping the item's identity.
    #[must_use]
    pub fn from_entry(entry: &CartEntry) -> Self {
        Self {
            title: entry.item.title.clone(),
            description: entry.item.description.clone(),
            image: entry.item.image.clone(),
            large_image: entry.item.large_image.clone(),
            price: entry.item.price,
            quantity: entry.cart_item.quantity,
        }
    }
}
