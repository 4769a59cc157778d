//! Domain models.
//!
//! These are validated domain objects, separate from database row shapes.
//! Sensitive material (password hashes, reset tokens) never appears here;
//! it stays inside the store implementations.

pub mod cart;
pub mod item;
pub mod order;
pub mod user;

pub use cart::{CartEntry, CartItem};
pub use item::{Item, ItemChanges, ItemDraft};
pub use order::{Order, OrderItem, OrderItemDraft};
pub use user::User;
