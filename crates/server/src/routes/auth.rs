//! Auth route handlers.
//!
//! Each successful signup, signin, or password reset issues a fresh session
//! token and installs it via `Set-Cookie`; signout clears the cookie. The
//! token itself never appears in a response body.

use axum::{
    Json,
    extract::State,
    http::header::SET_COOKIE,
    response::{AppendHeaders, IntoResponse},
};
use serde::Deserialize;
use serde_json::json;

use crate::error::Result;
use crate::middleware::{clear_session_cookie_header, session_cookie_header};
use crate::services;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RequestResetRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub reset_token: String,
    pub password: String,
    pub confirm_password: String,
}

/// POST /signup - register a new account and start a session.
pub async fn signup(
    State(state): State<AppState>,
    Json(body): Json<SignupRequest>,
) -> Result<impl IntoResponse> {
    let ctx = state.request_context(None);
    let user = services::auth::signup(&ctx, &body.email, &body.password).await?;

    let token = state.tokens().issue(user.id)?;
    Ok((
        AppendHeaders([(SET_COOKIE, session_cookie_header(&token))]),
        Json(user),
    ))
}

/// POST /signin - authenticate and start a session.
pub async fn signin(
    State(state): State<AppState>,
    Json(body): Json<SigninRequest>,
) -> Result<impl IntoResponse> {
    let ctx = state.request_context(None);
    let user = services::auth::signin(&ctx, &body.email, &body.password).await?;

    let token = state.tokens().issue(user.id)?;
    Ok((
        AppendHeaders([(SET_COOKIE, session_cookie_header(&token))]),
        Json(user),
    ))
}

/// POST /signout - clear the session cookie.
///
/// The token itself stays valid until expiry; signout only removes it from
/// the browser.
pub async fn signout() -> impl IntoResponse {
    (
        AppendHeaders([(SET_COOKIE, clear_session_cookie_header())]),
        Json(json!({ "message": "goodbye" })),
    )
}

/// POST /request-reset - mail a password reset link.
pub async fn request_reset(
    State(state): State<AppState>,
    Json(body): Json<RequestResetRequest>,
) -> Result<impl IntoResponse> {
    let ctx = state.request_context(None);
    let frontend_url = state.config().frontend_url.clone();
    services::auth::request_reset(&ctx, &body.email, &frontend_url).await?;
    Ok(Json(json!({ "message": "check your email" })))
}

/// POST /reset-password - redeem a reset token and start a session.
pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse> {
    let ctx = state.request_context(None);
    let user = services::auth::reset_password(
        &ctx,
        &body.reset_token,
        &body.password,
        &body.confirm_password,
    )
    .await?;

    let token = state.tokens().issue(user.id)?;
    Ok((
        AppendHeaders([(SET_COOKIE, session_cookie_header(&token))]),
        Json(user),
    ))
}
