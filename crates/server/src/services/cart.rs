//! Cart manager.
//!
//! A cart is the set of cart rows belonging to a user, one row per distinct
//! item. Adding an item the user already has increments that row instead of
//! creating another; the increment is atomic at the store level, so two
//! concurrent adds of the same item always land on a single row.

use thimble_core::{CartItemId, ItemId};

use crate::context::RequestContext;
use crate::error::AppError;
use crate::models::{CartEntry, CartItem};

/// Add one unit of an item to the caller's cart.
///
/// # Errors
///
/// `Unauthorized` for anonymous callers, `NotFound` if the item doesn't
/// exist in the catalog.
pub async fn add_to_cart(ctx: &RequestContext, item_id: ItemId) -> Result<CartItem, AppError> {
    let caller = ctx.caller()?;

    ctx.store
        .item_by_id(item_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no item with id {item_id}")))?;

    let cart_item = ctx.store.upsert_cart_item(caller.id, item_id).await?;

    tracing::debug!(
        user_id = %caller.id,
        item_id = %item_id,
        quantity = cart_item.quantity,
        "cart item added"
    );
    Ok(cart_item)
}

/// Remove an entire cart row, whatever its quantity.
///
/// # Errors
///
/// `Unauthorized` for anonymous callers, `NotFound` if the row doesn't
/// exist, `Forbidden` if it belongs to someone else.
pub async fn remove_from_cart(ctx: &RequestContext, id: CartItemId) -> Result<(), AppError> {
    let caller = ctx.caller()?;

    let cart_item = ctx
        .store
        .cart_item_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no cart item with id {id}")))?;

    if cart_item.user_id != caller.id {
        return Err(AppError::Forbidden("that cart item isn't yours".to_owned()));
    }

    ctx.store.delete_cart_item(id).await?;
    Ok(())
}

/// The caller's full cart, joined with live item data.
///
/// # Errors
///
/// `Unauthorized` for anonymous callers.
pub async fn cart(ctx: &RequestContext) -> Result<Vec<CartEntry>, AppError> {
    let caller = ctx.caller()?;
    Ok(ctx.store.cart_for_user(caller.id).await?)
}
