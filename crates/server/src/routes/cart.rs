//! Cart route handlers. All of them require an authenticated caller.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use serde_json::{Value, json};

use thimble_core::{CartItemId, ItemId};

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{CartEntry, CartItem};
use crate::services::cart;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub item_id: ItemId,
}

/// GET /cart - the caller's cart joined with live item data.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
) -> Result<Json<Vec<CartEntry>>> {
    let ctx = state.request_context(Some(caller));
    let entries = cart::cart(&ctx).await?;
    Ok(Json(entries))
}

/// POST /cart - add one unit of an item to the caller's cart.
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    Json(body): Json<AddToCartRequest>,
) -> Result<Json<CartItem>> {
    let ctx = state.request_context(Some(caller));
    let cart_item = cart::add_to_cart(&ctx, body.item_id).await?;
    Ok(Json(cart_item))
}

/// DELETE /cart/{id} - remove an entire cart row.
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    Path(id): Path<CartItemId>,
) -> Result<Json<Value>> {
    let ctx = state.request_context(Some(caller));
    cart::remove_from_cart(&ctx, id).await?;
    Ok(Json(json!({ "id": id })))
}
