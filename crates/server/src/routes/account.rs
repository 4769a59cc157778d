//! Account route handlers.

use std::collections::BTreeSet;

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use thimble_core::{Permission, UserId};

use crate::error::Result;
use crate::middleware::{CurrentUser, RequireAuth};
use crate::models::User;
use crate::services::guard;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdatePermissionsRequest {
    pub permissions: BTreeSet<Permission>,
}

/// GET /me - the current user, or `null` for anonymous callers.
pub async fn me(CurrentUser(user): CurrentUser) -> Json<Option<User>> {
    Json(user)
}

/// POST /users/{id}/permissions - replace a user's permission set.
pub async fn update_permissions(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    Path(id): Path<UserId>,
    Json(body): Json<UpdatePermissionsRequest>,
) -> Result<Json<User>> {
    let ctx = state.request_context(Some(caller));
    let user = guard::update_permissions(&ctx, id, body.permissions).await?;
    Ok(Json(user))
}
