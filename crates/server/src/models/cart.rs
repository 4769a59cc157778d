//! Cart domain types.

use serde::Serialize;

use thimble_core::{CartItemId, ItemId, UserId};

use super::Item;

/// One line in a user's cart.
///
/// Invariant: at most one row exists per `(user_id, item_id)` pair; repeated
/// adds increment `quantity` instead of inserting.
#[derive(Debug, Clone, Serialize)]
pub struct CartItem {
    /// Unique cart row ID.
    pub id: CartItemId,
    /// Owning user.
    pub user_id: UserId,
    /// Referenced catalog item.
    pub item_id: ItemId,
    /// Always >= 1.
    pub quantity: i32,
}

/// A cart row joined with its live catalog item, as loaded for checkout.
#[derive(Debug, Clone, Serialize)]
pub struct CartEntry {
    pub cart_item: CartItem,
    pub item: Item,
}
