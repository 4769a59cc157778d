//! Credential manager and password reset flow.
//!
//! Signup, signin, and the two-step recovery flow. Password hashing is
//! Argon2id with per-hash salts; verification always runs to completion
//! before any branch on its result.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};

use thimble_core::{Email, Permission};

use crate::context::RequestContext;
use crate::mail::nice_email;
use crate::models::User;
use crate::store::StoreError;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Reset tokens are this many random bytes, hex-encoded on the wire.
const RESET_TOKEN_BYTES: usize = 20;

/// How long a reset token stays redeemable.
const RESET_TOKEN_TTL_HOURS: i64 = 1;

/// Register a new account.
///
/// The email is normalized to lowercase by [`Email::parse`]; the password is
/// hashed before it goes anywhere near the store; the account starts with
/// the `{USER}` permission set.
///
/// # Errors
///
/// Returns `AuthError::InvalidEmail` if the email doesn't parse,
/// `AuthError::WeakPassword` if the password is too short, and
/// `AuthError::UserAlreadyExists` if the email is taken.
pub async fn signup(ctx: &RequestContext, email: &str, password: &str) -> Result<User, AuthError> {
    let email = Email::parse(email)?;
    validate_password(password)?;

    let password_hash = hash_password(password)?;

    let user = ctx
        .store
        .create_user(&email, &password_hash, &Permission::default_set())
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => AuthError::UserAlreadyExists,
            other => AuthError::Store(other),
        })?;

    tracing::info!(user_id = %user.id, "account created");
    Ok(user)
}

/// Authenticate with email and password.
///
/// # Errors
///
/// Returns `AuthError::UserNotFound` if no account exists for the email and
/// `AuthError::InvalidCredentials` if the password doesn't match.
pub async fn signin(ctx: &RequestContext, email: &str, password: &str) -> Result<User, AuthError> {
    let email = Email::parse(email)?;

    let (user, password_hash) = ctx
        .store
        .user_with_password(&email)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    // The verify call is synchronous and returns before we branch; there is
    // no pending result to mistake for success.
    verify_password(password, &password_hash)?;

    Ok(user)
}

/// Start the recovery flow: attach a short-lived single-use token to the
/// account and mail a reset link.
///
/// The mail send is awaited before this returns, so a success response
/// means the message was handed to the transport.
///
/// # Errors
///
/// Returns `AuthError::UserNotFound` if no account exists for the email.
/// (This leaks account existence; kept for API compatibility and noted as
/// hardening debt in DESIGN.md.)
pub async fn request_reset(
    ctx: &RequestContext,
    email: &str,
    frontend_url: &str,
) -> Result<(), AuthError> {
    let email = Email::parse(email)?;

    let user = ctx
        .store
        .user_by_email(&email)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    let token = generate_reset_token();
    let expiry = Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS);
    ctx.store.set_reset_token(user.id, &token, expiry).await?;

    let link = format!("{frontend_url}/reset?resetToken={token}");
    let body = nice_email(&format!(
        "Your password reset token is here! \
         <a href=\"{link}\">Click here to reset your password.</a> \
         The link expires in one hour."
    ));
    ctx.mailer
        .send(&user.email, "Your password reset token", &body)
        .await?;

    tracing::info!(user_id = %user.id, "password reset requested");
    Ok(())
}

/// Finish the recovery flow: redeem the token and set a new password.
///
/// The store consumes the token atomically - it must still be live
/// (`expiry >= now`) and is cleared in the same step, so a second redemption
/// always fails.
///
/// # Errors
///
/// Returns `AuthError::PasswordMismatch` if the confirmation differs and
/// `AuthError::InvalidOrExpiredToken` if the token is unknown, expired, or
/// already used.
pub async fn reset_password(
    ctx: &RequestContext,
    reset_token: &str,
    password: &str,
    confirm_password: &str,
) -> Result<User, AuthError> {
    if password != confirm_password {
        return Err(AuthError::PasswordMismatch);
    }
    validate_password(password)?;

    let password_hash = hash_password(password)?;

    let user = ctx
        .store
        .consume_reset_token(reset_token, Utc::now(), &password_hash)
        .await?
        .ok_or(AuthError::InvalidOrExpiredToken)?;

    tracing::info!(user_id = %user.id, "password reset completed");
    Ok(user)
}

/// Generate a cryptographically random reset token, hex-encoded.
#[must_use]
pub fn generate_reset_token() -> String {
    use argon2::password_hash::rand_core::RngCore;

    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
