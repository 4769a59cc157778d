//! Checkout orchestrator.
//!
//! Turns the caller's cart into a paid, immutable order. The total is
//! recomputed server-side from live prices with checked arithmetic; the
//! gateway is charged before anything is written, and the order plus cart
//! cleanup happen in a single atomic store step. What gets recorded as the
//! order total is the amount the gateway says it charged.

use thimble_core::{Cents, OrderId, Permission};

use crate::context::RequestContext;
use crate::error::AppError;
use crate::models::{Order, OrderItemDraft};
use crate::services::guard;

/// Charge the caller's cart and persist the resulting order.
///
/// # Errors
///
/// `Unauthorized` for anonymous callers, `Validation` for an empty cart or
/// an overflowing total, `PaymentFailed` if the gateway declines or cannot
/// be reached.
pub async fn create_order(
    ctx: &RequestContext,
    payment_token: &str,
    currency: &str,
) -> Result<Order, AppError> {
    let caller = ctx.caller()?;

    let entries = ctx.store.cart_for_user(caller.id).await?;
    if entries.is_empty() {
        return Err(AppError::Validation("your cart is empty".to_owned()));
    }

    let total = cart_total(&entries)
        .ok_or_else(|| AppError::Validation("cart total overflows".to_owned()))?;

    // Declines and transport failures alike surface as a payment failure;
    // either way no charge landed and nothing was written.
    let charge = ctx
        .gateway
        .charge(total, currency, payment_token)
        .await
        .map_err(|e| AppError::PaymentFailed(e.to_string()))?;

    let drafts: Vec<OrderItemDraft> = entries.iter().map(OrderItemDraft::from_entry).collect();
    let consumed: Vec<_> = entries.iter().map(|e| e.cart_item.id).collect();

    let order = ctx
        .store
        .place_order(caller.id, charge.amount, &charge.id, &drafts, &consumed)
        .await?;

    tracing::info!(
        user_id = %caller.id,
        order_id = %order.id,
        total = %order.total,
        charge_id = %order.charge_id,
        "order placed"
    );
    Ok(order)
}

/// Fetch one order. Visible to its owner and to admins.
///
/// # Errors
///
/// `Unauthorized` for anonymous callers, `NotFound` if the order doesn't
/// exist, `Forbidden` if it belongs to someone else and the caller isn't
/// an admin.
pub async fn order(ctx: &RequestContext, id: OrderId) -> Result<Order, AppError> {
    let caller = ctx.caller()?;

    let order = ctx
        .store
        .order_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no order with id {id}")))?;

    guard::ensure_owner_or(caller, order.user_id, &[Permission::Admin])?;
    Ok(order)
}

/// All of the caller's orders, newest first.
///
/// # Errors
///
/// `Unauthorized` for anonymous callers.
pub async fn orders(ctx: &RequestContext) -> Result<Vec<Order>, AppError> {
    let caller = ctx.caller()?;
    Ok(ctx.store.orders_for_user(caller.id).await?)
}

/// Sum `price * quantity` across the cart with checked arithmetic.
///
/// Returns `None` on overflow or a negative quantity.
fn cart_total(entries: &[crate::models::CartEntry]) -> Option<Cents> {
    entries.iter().try_fold(Cents::ZERO, |acc, entry| {
        let quantity = i64::try_from(entry.cart_item.quantity).ok()?;
        let line = entry.item.price.checked_mul(quantity)?;
        acc.checked_add(line)
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use thimble_core::{CartItemId, ItemId, UserId};

    use crate::models::{CartEntry, CartItem, Item};

    fn entry(price: i64, quantity: i32) -> CartEntry {
        CartEntry {
            cart_item: CartItem {
                id: CartItemId::new(1),
                user_id: UserId::new(1),
                item_id: ItemId::new(1),
                quantity,
            },
            item: Item {
                id: ItemId::new(1),
                title: "Thimble".to_owned(),
                description: "A tiny thimble".to_owned(),
                image: None,
                large_image: None,
                price: Cents::new(price),
                user_id: UserId::new(2),
            },
        }
    }

    #[test]
    fn test_cart_total_sums_lines() {
        let entries = vec![entry(500, 2), entry(250, 1)];
        assert_eq!(cart_total(&entries), Some(Cents::new(1250)));
    }

    #[test]
    fn test_cart_total_empty_is_zero() {
        assert_eq!(cart_total(&[]), Some(Cents::ZERO));
    }

    #[test]
    fn test_cart_total_overflow_is_none() {
        let entries = vec![entry(i64::MAX, 2)];
        assert_eq!(cart_total(&entries), None);
    }
}
