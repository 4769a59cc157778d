//! Catalog management and pass-through reads.
//!
//! Creation requires a logged-in caller; edits and deletions use the
//! ownership-or-permission pattern. Reads are open to everyone.

use thimble_core::{ItemId, Permission};

use crate::context::RequestContext;
use crate::error::AppError;
use crate::models::{Item, ItemChanges, ItemDraft};
use crate::services::guard;

/// Default page size for the item listing.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// List a new item. The caller becomes its owner.
///
/// # Errors
///
/// `Unauthorized` for anonymous callers, `Validation` for an empty title.
pub async fn create_item(ctx: &RequestContext, draft: ItemDraft) -> Result<Item, AppError> {
    let caller = ctx.caller()?;

    if draft.title.trim().is_empty() {
        return Err(AppError::Validation("item title cannot be empty".to_owned()));
    }

    let item = ctx.store.create_item(&draft, caller.id).await?;
    tracing::info!(item_id = %item.id, user_id = %caller.id, "item created");
    Ok(item)
}

/// Apply a partial update to an item.
///
/// # Errors
///
/// `NotFound` if the item doesn't exist, `Forbidden` unless the caller owns
/// it or holds `ADMIN` or `ITEMUPDATE`.
pub async fn update_item(
    ctx: &RequestContext,
    id: ItemId,
    changes: ItemChanges,
) -> Result<Item, AppError> {
    let caller = ctx.caller()?;

    let existing = ctx
        .store
        .item_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no item with id {id}")))?;

    guard::ensure_owner_or(
        caller,
        existing.user_id,
        &[Permission::Admin, Permission::ItemUpdate],
    )?;

    Ok(ctx.store.update_item(id, &changes).await?)
}

/// Delete an item from the catalog.
///
/// Historical orders are unaffected: their line items are snapshots, not
/// references.
///
/// # Errors
///
/// `NotFound` if the item doesn't exist, `Forbidden` unless the caller owns
/// it or holds `ADMIN` or `ITEMDELETE`.
pub async fn delete_item(ctx: &RequestContext, id: ItemId) -> Result<Item, AppError> {
    let caller = ctx.caller()?;

    let existing = ctx
        .store
        .item_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no item with id {id}")))?;

    guard::ensure_owner_or(
        caller,
        existing.user_id,
        &[Permission::Admin, Permission::ItemDelete],
    )?;

    ctx.store.delete_item(id).await?;
    tracing::info!(item_id = %id, user_id = %caller.id, "item deleted");
    Ok(existing)
}

/// Fetch one item. Open to anonymous callers.
///
/// # Errors
///
/// `NotFound` if the item doesn't exist.
pub async fn item(ctx: &RequestContext, id: ItemId) -> Result<Item, AppError> {
    ctx.store
        .item_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no item with id {id}")))
}

/// Page through the catalog in insertion order. Open to anonymous callers.
///
/// # Errors
///
/// Propagates store failures.
pub async fn items(
    ctx: &RequestContext,
    skip: Option<u32>,
    first: Option<u32>,
) -> Result<Vec<Item>, AppError> {
    let skip = skip.unwrap_or(0);
    let first = first.unwrap_or(DEFAULT_PAGE_SIZE);
    Ok(ctx.store.items(skip, first).await?)
}

/// Total number of catalog items. Open to anonymous callers.
///
/// # Errors
///
/// Propagates store failures.
pub async fn items_count(ctx: &RequestContext) -> Result<u64, AppError> {
    Ok(ctx.store.items_count().await?)
}
