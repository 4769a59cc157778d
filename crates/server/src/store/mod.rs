//! Data store contract.
//!
//! The engine talks to an opaque store through the [`Store`] trait; query
//! execution belongs to the implementations. Two are provided:
//!
//! - [`postgres::PgStore`] - production adapter over a sqlx `PgPool`
//! - [`memory::MemoryStore`] - in-process store for tests and local dev
//!
//! The two operations with real invariants are part of the contract itself so
//! every implementation must make them atomic:
//!
//! - [`Store::upsert_cart_item`] - insert-or-increment keyed on
//!   `(user, item)`, so concurrent identical adds can never duplicate rows
//! - [`Store::place_order`] - order creation and cart cleanup in one step,
//!   so a charged user can never be left with a stale cart

pub mod memory;
pub mod postgres;

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use thimble_core::{CartItemId, Cents, Email, ItemId, OrderId, Permission, UserId};

use crate::models::{CartEntry, CartItem, Item, ItemChanges, ItemDraft, Order, OrderItemDraft, User};

/// Errors surfaced by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the store is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g. unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Unique-keyed CRUD over the storefront's entities.
///
/// Implementations must uphold the uniqueness constraints documented on the
/// models: one user per email, one cart row per `(user, item)`.
#[async_trait]
pub trait Store: Send + Sync {
    /// Cheap connectivity check, for the readiness probe.
    async fn ping(&self) -> StoreResult<()>;

    // -------------------------------------------------------------------------
    // Users
    // -------------------------------------------------------------------------

    /// Create a user with a hashed password and an initial permission set.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the email is already registered.
    async fn create_user(
        &self,
        email: &Email,
        password_hash: &str,
        permissions: &BTreeSet<Permission>,
    ) -> StoreResult<User>;

    async fn user_by_id(&self, id: UserId) -> StoreResult<Option<User>>;

    async fn user_by_email(&self, email: &Email) -> StoreResult<Option<User>>;

    /// Get a user and their password hash by email, for signin.
    ///
    /// Returns `None` if no such account exists.
    async fn user_with_password(&self, email: &Email) -> StoreResult<Option<(User, String)>>;

    /// Attach a reset token and its expiry to a user.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the user doesn't exist.
    async fn set_reset_token(
        &self,
        id: UserId,
        token: &str,
        expiry: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// Atomically consume a reset token: find the user whose live token
    /// matches and whose expiry is at or after `now`, set the new password
    /// hash, and clear the token in the same step.
    ///
    /// Returns `None` when no user matches - the token is unknown, expired,
    /// or already consumed. Atomicity is what makes tokens single-use under
    /// concurrent redemption.
    async fn consume_reset_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
        new_password_hash: &str,
    ) -> StoreResult<Option<User>>;

    /// Replace a user's entire permission set (full replace, not merge).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the user doesn't exist.
    async fn replace_permissions(
        &self,
        id: UserId,
        permissions: &BTreeSet<Permission>,
    ) -> StoreResult<User>;

    // -------------------------------------------------------------------------
    // Items
    // -------------------------------------------------------------------------

    async fn create_item(&self, draft: &ItemDraft, owner: UserId) -> StoreResult<Item>;

    async fn item_by_id(&self, id: ItemId) -> StoreResult<Option<Item>>;

    /// Apply a partial update. The ID is never updated.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the item doesn't exist.
    async fn update_item(&self, id: ItemId, changes: &ItemChanges) -> StoreResult<Item>;

    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the item doesn't exist.
    async fn delete_item(&self, id: ItemId) -> StoreResult<()>;

    /// Page through items in insertion order.
    async fn items(&self, skip: u32, first: u32) -> StoreResult<Vec<Item>>;

    /// Total item count, for the connection read.
    async fn items_count(&self) -> StoreResult<u64>;

    // -------------------------------------------------------------------------
    // Cart
    // -------------------------------------------------------------------------

    /// Atomic conditional upsert: insert a row with quantity 1, or increment
    /// the existing `(user, item)` row by exactly 1.
    async fn upsert_cart_item(&self, user: UserId, item: ItemId) -> StoreResult<CartItem>;

    async fn cart_item_by_id(&self, id: CartItemId) -> StoreResult<Option<CartItem>>;

    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the cart row doesn't exist.
    async fn delete_cart_item(&self, id: CartItemId) -> StoreResult<()>;

    /// Load a user's full cart joined with live item data.
    async fn cart_for_user(&self, user: UserId) -> StoreResult<Vec<CartEntry>>;

    // -------------------------------------------------------------------------
    // Orders
    // -------------------------------------------------------------------------

    /// Create an immutable order and delete the consumed cart rows in one
    /// atomic step.
    async fn place_order(
        &self,
        user: UserId,
        total: Cents,
        charge_id: &str,
        items: &[OrderItemDraft],
        consumed: &[CartItemId],
    ) -> StoreResult<Order>;

    async fn order_by_id(&self, id: OrderId) -> StoreResult<Option<Order>>;

    /// All orders placed by a user, newest first.
    async fn orders_for_user(&self, user: UserId) -> StoreResult<Vec<Order>>;
}
