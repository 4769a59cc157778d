//! Authentication extractors.
//!
//! Resolve the caller from the session cookie. Verification is silent:
//! a missing, expired, or tampered token means an anonymous caller, never
//! a rejected request. Handlers that require identity use [`RequireAuth`];
//! everything else takes [`CurrentUser`] and decides for itself.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
};
use axum_extra::extract::CookieJar;

use crate::error::AppError;
use crate::middleware::session::SESSION_COOKIE_NAME;
use crate::models::User;
use crate::state::AppState;

/// Extractor that optionally resolves the current user.
///
/// Never rejects; carries `None` for anonymous requests.
pub struct CurrentUser(pub Option<User>);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);

        let Some(cookie) = jar.get(SESSION_COOKIE_NAME) else {
            return Ok(Self(None));
        };

        // Bad or expired tokens resolve to anonymous, not to an error.
        let Some(user_id) = state.tokens().verify(cookie.value()) else {
            return Ok(Self(None));
        };

        // A valid token for a since-deleted user also resolves to anonymous.
        let user = state.store().user_by_id(user_id).await?;
        Ok(Self(user))
    }
}

/// Extractor that requires an authenticated caller.
pub struct RequireAuth(pub User);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        user.map(Self)
            .ok_or_else(|| AppError::Unauthorized("you must be logged in".to_owned()))
    }
}
