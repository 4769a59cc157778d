//! End-to-end tests for signup, signin, and the password reset flow,
//! running the services against the in-memory store.

#![allow(clippy::unwrap_used)]

mod common;

use std::collections::BTreeSet;

use chrono::{Duration, Utc};

use thimble_core::Permission;
use thimble_server::error::AppError;
use thimble_server::services::{auth, guard};
use thimble_server::store::Store;

use common::Harness;

const FRONTEND: &str = "https://shop.example.com";

#[tokio::test]
async fn signup_normalizes_email_and_grants_user_permission() {
    let h = Harness::new();
    let ctx = h.ctx(None);

    let user = auth::signup(&ctx, "Wes@Example.COM", "hunter2hunter2")
        .await
        .unwrap();

    assert_eq!(user.email.as_str(), "wes@example.com");
    assert_eq!(
        user.permissions,
        BTreeSet::from([Permission::User]),
        "new accounts start with exactly the USER permission"
    );
}

#[tokio::test]
async fn signup_never_stores_the_raw_password() {
    let h = Harness::new();
    let ctx = h.ctx(None);

    let user = auth::signup(&ctx, "a@x.com", "plaintext-password")
        .await
        .unwrap();

    let (_, hash) = h
        .store
        .user_with_password(&user.email)
        .await
        .unwrap()
        .unwrap();
    assert_ne!(hash, "plaintext-password");
    assert!(hash.starts_with("$argon2"));
}

#[tokio::test]
async fn signup_rejects_duplicate_email_case_insensitively() {
    let h = Harness::new();
    let ctx = h.ctx(None);

    auth::signup(&ctx, "a@x.com", "hunter2hunter2").await.unwrap();
    let err = auth::signup(&ctx, "A@X.com", "hunter2hunter2")
        .await
        .unwrap_err();
    assert!(matches!(err, auth::AuthError::UserAlreadyExists));
}

#[tokio::test]
async fn signin_roundtrip_and_failure_modes() {
    let h = Harness::new();
    let ctx = h.ctx(None);

    let created = auth::signup(&ctx, "a@x.com", "hunter2hunter2").await.unwrap();

    let signed_in = auth::signin(&ctx, "a@x.com", "hunter2hunter2").await.unwrap();
    assert_eq!(signed_in.id, created.id);

    assert!(matches!(
        auth::signin(&ctx, "a@x.com", "wrong-password").await.unwrap_err(),
        auth::AuthError::InvalidCredentials
    ));
    assert!(matches!(
        auth::signin(&ctx, "nobody@x.com", "hunter2hunter2").await.unwrap_err(),
        auth::AuthError::UserNotFound
    ));
}

/// Pull the reset token out of the mailed link.
fn token_from_mail(body: &str) -> String {
    let start = body.find("resetToken=").expect("mail contains a reset link") + "resetToken=".len();
    body[start..]
        .chars()
        .take_while(char::is_ascii_hexdigit)
        .collect()
}

#[tokio::test]
async fn password_reset_flow_end_to_end() {
    let h = Harness::new();
    let ctx = h.ctx(None);

    auth::signup(&ctx, "a@x.com", "old-password-1").await.unwrap();
    auth::request_reset(&ctx, "a@x.com", FRONTEND).await.unwrap();

    let sent = h.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "a@x.com");
    assert!(sent[0].2.contains(FRONTEND));

    let token = token_from_mail(&sent[0].2);
    assert_eq!(token.len(), 40);

    let user = auth::reset_password(&ctx, &token, "new-password-1", "new-password-1")
        .await
        .unwrap();
    assert_eq!(user.email.as_str(), "a@x.com");

    // Old password is dead, new one works
    assert!(auth::signin(&ctx, "a@x.com", "old-password-1").await.is_err());
    assert!(auth::signin(&ctx, "a@x.com", "new-password-1").await.is_ok());

    // The token was consumed; replay fails
    assert!(matches!(
        auth::reset_password(&ctx, &token, "third-password", "third-password")
            .await
            .unwrap_err(),
        auth::AuthError::InvalidOrExpiredToken
    ));
}

#[tokio::test]
async fn reset_rejects_mismatched_confirmation() {
    let h = Harness::new();
    let ctx = h.ctx(None);

    auth::signup(&ctx, "a@x.com", "old-password-1").await.unwrap();

    let err = auth::reset_password(&ctx, "whatever", "new-password-1", "different")
        .await
        .unwrap_err();
    assert!(matches!(err, auth::AuthError::PasswordMismatch));
    // Mismatch is caught before the token is ever looked at, so nothing
    // about the account changed.
    assert!(auth::signin(&ctx, "a@x.com", "old-password-1").await.is_ok());
}

#[tokio::test]
async fn reset_rejects_expired_token() {
    let h = Harness::new();
    let ctx = h.ctx(None);

    let user = auth::signup(&ctx, "a@x.com", "old-password-1").await.unwrap();
    h.store
        .set_reset_token(user.id, "deadbeef", Utc::now() - Duration::minutes(1))
        .await
        .unwrap();

    let err = auth::reset_password(&ctx, "deadbeef", "new-password-1", "new-password-1")
        .await
        .unwrap_err();
    assert!(matches!(err, auth::AuthError::InvalidOrExpiredToken));
}

#[tokio::test]
async fn permission_update_requires_admin_and_replaces_wholesale() {
    let h = Harness::new();
    let ctx = h.ctx(None);

    let admin = auth::signup(&ctx, "admin@x.com", "hunter2hunter2").await.unwrap();
    let target = auth::signup(&ctx, "user@x.com", "hunter2hunter2").await.unwrap();

    // Anonymous callers are rejected outright
    assert!(matches!(
        guard::update_permissions(&h.ctx(None), target.id, BTreeSet::from([Permission::Admin]))
            .await
            .unwrap_err(),
        AppError::Unauthorized(_)
    ));

    // A plain user may not grant permissions, not even to themselves
    assert!(matches!(
        guard::update_permissions(
            &h.ctx(Some(target.clone())),
            target.id,
            BTreeSet::from([Permission::Admin])
        )
        .await
        .unwrap_err(),
        AppError::Forbidden(_)
    ));

    // Promote the admin directly in the store, then exercise the guard
    let admin = h
        .store
        .replace_permissions(admin.id, &BTreeSet::from([Permission::Admin]))
        .await
        .unwrap();

    let updated = guard::update_permissions(
        &h.ctx(Some(admin.clone())),
        target.id,
        BTreeSet::from([Permission::User, Permission::ItemCreate]),
    )
    .await
    .unwrap();
    assert_eq!(
        updated.permissions,
        BTreeSet::from([Permission::User, Permission::ItemCreate])
    );

    // Full replace: granting a smaller set drops what's missing
    let updated = guard::update_permissions(
        &h.ctx(Some(admin)),
        target.id,
        BTreeSet::from([Permission::User]),
    )
    .await
    .unwrap();
    assert_eq!(updated.permissions, BTreeSet::from([Permission::User]));
}

#[tokio::test]
async fn permission_update_rejects_an_empty_set() {
    let h = Harness::new();
    let ctx = h.ctx(None);

    let admin = auth::signup(&ctx, "admin@x.com", "hunter2hunter2").await.unwrap();
    let target = auth::signup(&ctx, "user@x.com", "hunter2hunter2").await.unwrap();

    let admin = h
        .store
        .replace_permissions(admin.id, &BTreeSet::from([Permission::Admin]))
        .await
        .unwrap();

    // Even an admin may not strip a user down to nothing
    let err = guard::update_permissions(&h.ctx(Some(admin)), target.id, BTreeSet::new())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let untouched = h.store.user_by_id(target.id).await.unwrap().unwrap();
    assert_eq!(untouched.permissions, BTreeSet::from([Permission::User]));
}
