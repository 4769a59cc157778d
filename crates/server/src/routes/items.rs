//! Catalog route handlers.
//!
//! Reads are open to everyone; writes go through the catalog service's
//! ownership and permission checks.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};

use thimble_core::ItemId;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{Item, ItemChanges, ItemDraft};
use crate::services::catalog;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ItemsQuery {
    pub skip: Option<u32>,
    pub first: Option<u32>,
}

/// GET /items - paged listing in insertion order.
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ItemsQuery>,
) -> Result<Json<Vec<Item>>> {
    let ctx = state.request_context(None);
    let items = catalog::items(&ctx, query.skip, query.first).await?;
    Ok(Json(items))
}

/// GET /items/count - total catalog size.
pub async fn count(State(state): State<AppState>) -> Result<Json<Value>> {
    let ctx = state.request_context(None);
    let count = catalog::items_count(&ctx).await?;
    Ok(Json(json!({ "count": count })))
}

/// GET /items/{id} - item detail.
pub async fn show(State(state): State<AppState>, Path(id): Path<ItemId>) -> Result<Json<Item>> {
    let ctx = state.request_context(None);
    let item = catalog::item(&ctx, id).await?;
    Ok(Json(item))
}

/// POST /items - create an item owned by the caller.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    Json(draft): Json<ItemDraft>,
) -> Result<Json<Item>> {
    let ctx = state.request_context(Some(caller));
    let item = catalog::create_item(&ctx, draft).await?;
    Ok(Json(item))
}

/// PATCH /items/{id} - partial update.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    Path(id): Path<ItemId>,
    Json(changes): Json<ItemChanges>,
) -> Result<Json<Item>> {
    let ctx = state.request_context(Some(caller));
    let item = catalog::update_item(&ctx, id, changes).await?;
    Ok(Json(item))
}

/// DELETE /items/{id} - delete an item; responds with the deleted item.
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    Path(id): Path<ItemId>,
) -> Result<Json<Item>> {
    let ctx = state.request_context(Some(caller));
    let item = catalog::delete_item(&ctx, id).await?;
    Ok(Json(item))
}
