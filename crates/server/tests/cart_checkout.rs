//! End-to-end tests for the cart manager and checkout orchestrator.

#![allow(clippy::unwrap_used)]

mod common;

use std::collections::BTreeSet;

use thimble_core::{CartItemId, Cents, ItemId, Permission};
use thimble_server::error::AppError;
use thimble_server::models::{ItemDraft, User};
use thimble_server::services::{auth, cart, catalog, checkout};
use thimble_server::store::Store;

use common::Harness;

async fn user(h: &Harness, email: &str) -> User {
    auth::signup(&h.ctx(None), email, "hunter2hunter2")
        .await
        .unwrap()
}

async fn listed_item(h: &Harness, owner: &User, title: &str, price: i64) -> ItemId {
    let ctx = h.ctx(Some(owner.clone()));
    let item = catalog::create_item(
        &ctx,
        ItemDraft {
            title: title.to_owned(),
            description: format!("{title} description"),
            image: None,
            large_image: None,
            price: Cents::new(price),
        },
    )
    .await
    .unwrap();
    item.id
}

#[tokio::test]
async fn cart_requires_a_logged_in_caller() {
    let h = Harness::new();
    let err = cart::add_to_cart(&h.ctx(None), ItemId::new(1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
}

#[tokio::test]
async fn adding_an_unknown_item_is_not_found() {
    let h = Harness::new();
    let buyer = user(&h, "buyer@x.com").await;

    let err = cart::add_to_cart(&h.ctx(Some(buyer)), ItemId::new(999))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn repeated_adds_increment_one_row() {
    let h = Harness::new();
    let seller = user(&h, "seller@x.com").await;
    let buyer = user(&h, "buyer@x.com").await;
    let item_id = listed_item(&h, &seller, "Thimble", 500).await;

    let ctx = h.ctx(Some(buyer));
    let first = cart::add_to_cart(&ctx, item_id).await.unwrap();
    let second = cart::add_to_cart(&ctx, item_id).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.quantity, 2);

    let entries = cart::cart(&ctx).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].cart_item.quantity, 2);
}

#[tokio::test]
async fn concurrent_adds_collapse_to_one_row() {
    const ADDS: usize = 16;

    let h = Harness::new();
    let seller = user(&h, "seller@x.com").await;
    let buyer = user(&h, "buyer@x.com").await;
    let item_id = listed_item(&h, &seller, "Thimble", 500).await;

    let ctx = h.ctx(Some(buyer));
    let mut handles = Vec::new();
    for _ in 0..ADDS {
        let ctx = ctx.clone();
        handles.push(tokio::spawn(
            async move { cart::add_to_cart(&ctx, item_id).await },
        ));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let entries = cart::cart(&ctx).await.unwrap();
    assert_eq!(entries.len(), 1, "concurrent adds must never duplicate rows");
    assert_eq!(entries[0].cart_item.quantity, i32::try_from(ADDS).unwrap());
}

#[tokio::test]
async fn removing_someone_elses_cart_row_is_forbidden() {
    let h = Harness::new();
    let seller = user(&h, "seller@x.com").await;
    let buyer = user(&h, "buyer@x.com").await;
    let other = user(&h, "other@x.com").await;
    let item_id = listed_item(&h, &seller, "Thimble", 500).await;

    let row = cart::add_to_cart(&h.ctx(Some(buyer.clone())), item_id)
        .await
        .unwrap();

    let err = cart::remove_from_cart(&h.ctx(Some(other)), row.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    // The row survives, and its owner can still remove it
    cart::remove_from_cart(&h.ctx(Some(buyer.clone())), row.id)
        .await
        .unwrap();
    assert!(cart::cart(&h.ctx(Some(buyer))).await.unwrap().is_empty());
}

#[tokio::test]
async fn removing_a_missing_row_is_not_found() {
    let h = Harness::new();
    let buyer = user(&h, "buyer@x.com").await;

    let err = cart::remove_from_cart(&h.ctx(Some(buyer)), CartItemId::new(404))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn checkout_of_an_empty_cart_is_rejected() {
    let h = Harness::new();
    let buyer = user(&h, "buyer@x.com").await;

    let err = checkout::create_order(&h.ctx(Some(buyer)), "tok_visa", "USD")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert!(h.gateway.charged_amounts().is_empty());
}

#[tokio::test]
async fn checkout_charges_the_recomputed_total_and_empties_the_cart() {
    let h = Harness::new();
    let seller = user(&h, "seller@x.com").await;
    let buyer = user(&h, "buyer@x.com").await;
    let hat = listed_item(&h, &seller, "Hat", 500).await;
    let scarf = listed_item(&h, &seller, "Scarf", 250).await;

    let ctx = h.ctx(Some(buyer));
    cart::add_to_cart(&ctx, hat).await.unwrap();
    cart::add_to_cart(&ctx, hat).await.unwrap();
    cart::add_to_cart(&ctx, scarf).await.unwrap();

    let order = checkout::create_order(&ctx, "tok_visa", "USD").await.unwrap();

    // 2 * 500 + 250
    assert_eq!(order.total, Cents::new(1250));
    assert_eq!(h.gateway.charged_amounts(), vec![Cents::new(1250)]);
    assert_eq!(order.items.len(), 2);
    assert!(cart::cart(&ctx).await.unwrap().is_empty());
}

#[tokio::test]
async fn order_snapshots_survive_catalog_deletion() {
    let h = Harness::new();
    let seller = user(&h, "seller@x.com").await;
    let buyer = user(&h, "buyer@x.com").await;
    let hat = listed_item(&h, &seller, "Hat", 500).await;

    let ctx = h.ctx(Some(buyer));
    cart::add_to_cart(&ctx, hat).await.unwrap();
    let order = checkout::create_order(&ctx, "tok_visa", "USD").await.unwrap();

    catalog::delete_item(&h.ctx(Some(seller)), hat).await.unwrap();

    let fetched = checkout::order(&ctx, order.id).await.unwrap();
    assert_eq!(fetched.items.len(), 1);
    assert_eq!(fetched.items[0].title, "Hat");
    assert_eq!(fetched.items[0].price, Cents::new(500));
}

#[tokio::test]
async fn declined_charge_leaves_the_cart_intact() {
    let h = Harness::new();
    let seller = user(&h, "seller@x.com").await;
    let buyer = user(&h, "buyer@x.com").await;
    let hat = listed_item(&h, &seller, "Hat", 500).await;

    let ctx = h.ctx(Some(buyer));
    cart::add_to_cart(&ctx, hat).await.unwrap();

    h.gateway.decline_next();
    let err = checkout::create_order(&ctx, "tok_visa", "USD").await.unwrap_err();
    assert!(matches!(err, AppError::PaymentFailed(_)));

    // Nothing was written and nothing was consumed
    assert_eq!(cart::cart(&ctx).await.unwrap().len(), 1);
    assert!(checkout::orders(&ctx).await.unwrap().is_empty());
}

#[tokio::test]
async fn orders_are_visible_to_their_owner_and_to_admins_only() {
    let h = Harness::new();
    let seller = user(&h, "seller@x.com").await;
    let buyer = user(&h, "buyer@x.com").await;
    let snoop = user(&h, "snoop@x.com").await;
    let hat = listed_item(&h, &seller, "Hat", 500).await;

    let ctx = h.ctx(Some(buyer.clone()));
    cart::add_to_cart(&ctx, hat).await.unwrap();
    let order = checkout::create_order(&ctx, "tok_visa", "USD").await.unwrap();

    assert!(checkout::order(&ctx, order.id).await.is_ok());

    let err = checkout::order(&h.ctx(Some(snoop.clone())), order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let admin = h
        .store
        .replace_permissions(snoop.id, &BTreeSet::from([Permission::Admin]))
        .await
        .unwrap();
    assert!(checkout::order(&h.ctx(Some(admin)), order.id).await.is_ok());
}

#[tokio::test]
async fn item_edits_enforce_ownership_or_override() {
    let h = Harness::new();
    let seller = user(&h, "seller@x.com").await;
    let other = user(&h, "other@x.com").await;
    let hat = listed_item(&h, &seller, "Hat", 500).await;

    let err = catalog::delete_item(&h.ctx(Some(other.clone())), hat)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let editor = h
        .store
        .replace_permissions(other.id, &BTreeSet::from([Permission::ItemUpdate]))
        .await
        .unwrap();

    // ITEMUPDATE allows edits but not deletion
    let changed = catalog::update_item(
        &h.ctx(Some(editor.clone())),
        hat,
        thimble_server::models::ItemChanges {
            price: Some(Cents::new(750)),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(changed.price, Cents::new(750));

    assert!(matches!(
        catalog::delete_item(&h.ctx(Some(editor)), hat).await.unwrap_err(),
        AppError::Forbidden(_)
    ));

    // The owner can always delete their own listing
    catalog::delete_item(&h.ctx(Some(seller)), hat).await.unwrap();
}
