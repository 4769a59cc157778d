//! Order route handlers. All of them require an authenticated caller.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use thimble_core::OrderId;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::Order;
use crate::services::checkout;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    /// Single-use payment source token from the frontend's gateway widget.
    pub token: String,
}

/// POST /orders - charge the caller's cart and place an order.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    Json(body): Json<CreateOrderRequest>,
) -> Result<Json<Order>> {
    let currency = state.config().stripe.currency.clone();
    let ctx = state.request_context(Some(caller));
    let order = checkout::create_order(&ctx, &body.token, &currency).await?;
    Ok(Json(order))
}

/// GET /orders - the caller's order history, newest first.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    let ctx = state.request_context(Some(caller));
    let orders = checkout::orders(&ctx).await?;
    Ok(Json(orders))
}

/// GET /orders/{id} - order detail, visible to its owner and to admins.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    let ctx = state.request_context(Some(caller));
    let order = checkout::order(&ctx, id).await?;
    Ok(Json(order))
}
