//! Authentication error type.

use thiserror::Error;

use thimble_core::EmailError;

use crate::mail::MailError;
use crate::store::StoreError;

/// Errors from the credential manager and password reset flow.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Password did not match the stored hash.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// No account with the given email.
    #[error("no account for that email")]
    UserNotFound,

    /// The email is already registered.
    #[error("an account with this email already exists")]
    UserAlreadyExists,

    /// Password fails the minimum requirements.
    #[error("weak password: {0}")]
    WeakPassword(String),

    /// Email failed to parse.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// New password and confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// Reset token is unknown, expired, or already consumed.
    #[error("this reset token is invalid or expired")]
    InvalidOrExpiredToken,

    /// Hashing failed internally.
    #[error("password hashing failed")]
    PasswordHash,

    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Mail transport failure.
    #[error(transparent)]
    Mail(#[from] MailError),
}
