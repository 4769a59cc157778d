//! In-memory store for tests and local development.
//!
//! All operations take one lock over the whole dataset, which trivially gives
//! the atomicity the [`Store`](super::Store) contract requires from
//! `upsert_cart_item`, `consume_reset_token`, and `place_order`.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use thimble_core::{CartItemId, Cents, Email, ItemId, OrderId, OrderItemId, Permission, UserId};

use crate::models::{
    CartEntry, CartItem, Item, ItemChanges, ItemDraft, Order, OrderItem, OrderItemDraft, User,
};

use super::{Store, StoreError, StoreResult};

/// One user row, including the secrets the domain model never exposes.
#[derive(Debug, Clone)]
struct UserRecord {
    user: User,
    password_hash: String,
    reset_token: Option<String>,
    reset_token_expiry: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: i32,
    users: BTreeMap<UserId, UserRecord>,
    items: BTreeMap<ItemId, Item>,
    cart: BTreeMap<CartItemId, CartItem>,
    orders: BTreeMap<OrderId, Order>,
}

impl Inner {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

/// An in-process [`Store`] backed by a single mutex.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn create_user(
        &self,
        email: &Email,
        password_hash: &str,
        permissions: &BTreeSet<Permission>,
    ) -> StoreResult<User> {
        let mut inner = self.lock();

        if inner.users.values().any(|r| r.user.email == *email) {
            return Err(StoreError::Conflict("email already exists".to_owned()));
        }

        let user = User {
            id: UserId::new(inner.next_id()),
            email: email.clone(),
            permissions: permissions.clone(),
            created_at: Utc::now(),
        };
        inner.users.insert(
            user.id,
            UserRecord {
                user: user.clone(),
                password_hash: password_hash.to_owned(),
                reset_token: None,
                reset_token_expiry: None,
            },
        );

        Ok(user)
    }

    async fn user_by_id(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.lock().users.get(&id).map(|r| r.user.clone()))
    }

    async fn user_by_email(&self, email: &Email) -> StoreResult<Option<User>> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|r| r.user.email == *email)
            .map(|r| r.user.clone()))
    }

    async fn user_with_password(&self, email: &Email) -> StoreResult<Option<(User, String)>> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|r| r.user.email == *email)
            .map(|r| (r.user.clone(), r.password_hash.clone())))
    }

    async fn set_reset_token(
        &self,
        id: UserId,
        token: &str,
        expiry: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut inner = self.lock();
        let record = inner.users.get_mut(&id).ok_or(StoreError::NotFound)?;
        record.reset_token = Some(token.to_owned());
        record.reset_token_expiry = Some(expiry);
        Ok(())
    }

    async fn consume_reset_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
        new_password_hash: &str,
    ) -> StoreResult<Option<User>> {
        let mut inner = self.lock();

        let record = inner.users.values_mut().find(|r| {
            r.reset_token.as_deref() == Some(token)
                && r.reset_token_expiry.is_some_and(|expiry| expiry >= now)
        });

        Ok(record.map(|r| {
            r.password_hash = new_password_hash.to_owned();
            r.reset_token = None;
            r.reset_token_expiry = None;
            r.user.clone()
        }))
    }

    async fn replace_permissions(
        &self,
        id: UserId,
        permissions: &BTreeSet<Permission>,
    ) -> StoreResult<User> {
        let mut inner = self.lock();
        let record = inner.users.get_mut(&id).ok_or(StoreError::NotFound)?;
        record.user.permissions = permissions.clone();
        Ok(record.user.clone())
    }

    async fn create_item(&self, draft: &ItemDraft, owner: UserId) -> StoreResult<Item> {
        let mut inner = self.lock();
        let item = Item {
            id: ItemId::new(inner.next_id()),
            title: draft.title.clone(),
            description: draft.description.clone(),
            image: draft.image.clone(),
            large_image: draft.large_image.clone(),
            price: draft.price,
            user_id: owner,
        };
        inner.items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn item_by_id(&self, id: ItemId) -> StoreResult<Option<Item>> {
        Ok(self.lock().items.get(&id).cloned())
    }

    async fn update_item(&self, id: ItemId, changes: &ItemChanges) -> StoreResult<Item> {
        let mut inner = self.lock();
        let item = inner.items.get_mut(&id).ok_or(StoreError::NotFound)?;
        if let Some(title) = &changes.title {
            item.title.clone_from(title);
        }
        if let Some(description) = &changes.description {
            item.description.clone_from(description);
        }
        if let Some(image) = &changes.image {
            item.image = Some(image.clone());
        }
        if let Some(large_image) = &changes.large_image {
            item.large_image = Some(large_image.clone());
        }
        if let Some(price) = changes.price {
            item.price = price;
        }
        Ok(item.clone())
    }

    async fn delete_item(&self, id: ItemId) -> StoreResult<()> {
        let mut inner = self.lock();
        inner.items.remove(&id).ok_or(StoreError::NotFound)?;
        Ok(())
    }

    async fn items(&self, skip: u32, first: u32) -> StoreResult<Vec<Item>> {
        Ok(self
            .lock()
            .items
            .values()
            .skip(skip as usize)
            .take(first as usize)
            .cloned()
            .collect())
    }

    async fn items_count(&self) -> StoreResult<u64> {
        Ok(self.lock().items.len() as u64)
    }

    async fn upsert_cart_item(&self, user: UserId, item: ItemId) -> StoreResult<CartItem> {
        let mut inner = self.lock();

        if let Some(existing) = inner
            .cart
            .values_mut()
            .find(|c| c.user_id == user && c.item_id == item)
        {
            existing.quantity += 1;
            return Ok(existing.clone());
        }

        let row = CartItem {
            id: CartItemId::new(inner.next_id()),
            user_id: user,
            item_id: item,
            quantity: 1,
        };
        inner.cart.insert(row.id, row.clone());
        Ok(row)
    }

    async fn cart_item_by_id(&self, id: CartItemId) -> StoreResult<Option<CartItem>> {
        Ok(self.lock().cart.get(&id).cloned())
    }

    async fn delete_cart_item(&self, id: CartItemId) -> StoreResult<()> {
        let mut inner = self.lock();
        inner.cart.remove(&id).ok_or(StoreError::NotFound)?;
        Ok(())
    }

    async fn cart_for_user(&self, user: UserId) -> StoreResult<Vec<CartEntry>> {
        let inner = self.lock();
        let mut entries = Vec::new();
        for cart_item in inner.cart.values().filter(|c| c.user_id == user) {
            // Rows whose item has since been deleted contribute nothing
            if let Some(item) = inner.items.get(&cart_item.item_id) {
                entries.push(CartEntry {
                    cart_item: cart_item.clone(),
                    item: item.clone(),
                });
            }
        }
        Ok(entries)
    }

    async fn place_order(
        &self,
        user: UserId,
        total: Cents,
        charge_id: &str,
        items: &[OrderItemDraft],
        consumed: &[CartItemId],
    ) -> StoreResult<Order> {
        let mut inner = self.lock();

        let order_id = OrderId::new(inner.next_id());
        let order_items = items
            .iter()
            .map(|draft| {
                let id = OrderItemId::new(inner.next_id());
                OrderItem {
                    id,
                    title: draft.title.clone(),
                    description: draft.description.clone(),
                    image: draft.image.clone(),
                    large_image: draft.large_image.clone(),
                    price: draft.price,
                    quantity: draft.quantity,
                }
            })
            .collect();

        let order = Order {
            id: order_id,
            total,
            charge_id: charge_id.to_owned(),
            items: order_items,
            user_id: user,
            created_at: Utc::now(),
        };
        inner.orders.insert(order.id, order.clone());

        for id in consumed {
            inner.cart.remove(id);
        }

        Ok(order)
    }

    async fn order_by_id(&self, id: OrderId) -> StoreResult<Option<Order>> {
        Ok(self.lock().orders.get(&id).cloned())
    }

    async fn orders_for_user(&self, user: UserId) -> StoreResult<Vec<Order>> {
        let inner = self.lock();
        let mut orders: Vec<Order> = inner
            .orders
            .values()
            .filter(|o| o.user_id == user)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn email(s: &str) -> Email {
        Email::parse(s).unwrap()
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = MemoryStore::new();
        store
            .create_user(&email("a@x.com"), "hash", &Permission::default_set())
            .await
            .unwrap();
        let err = store
            .create_user(&email("a@x.com"), "hash", &Permission::default_set())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn upsert_increments_single_row() {
        let store = MemoryStore::new();
        let user = store
            .create_user(&email("a@x.com"), "hash", &Permission::default_set())
            .await
            .unwrap();
        let item = store
            .create_item(
                &ItemDraft {
                    title: "Hat".into(),
                    description: "A hat".into(),
                    image: None,
                    large_image: None,
                    price: Cents::new(500),
                },
                user.id,
            )
            .await
            .unwrap();

        let first = store.upsert_cart_item(user.id, item.id).await.unwrap();
        let second = store.upsert_cart_item(user.id, item.id).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.quantity, 2);
        assert_eq!(store.cart_for_user(user.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn consume_reset_token_is_single_use() {
        let store = MemoryStore::new();
        let user = store
            .create_user(&email("a@x.com"), "hash", &Permission::default_set())
            .await
            .unwrap();
        let expiry = Utc::now() + chrono::Duration::hours(1);
        store
            .set_reset_token(user.id, "token123", expiry)
            .await
            .unwrap();

        let now = Utc::now();
        let hit = store
            .consume_reset_token("token123", now, "newhash")
            .await
            .unwrap();
        assert!(hit.is_some());

        let replay = store
            .consume_reset_token("token123", now, "otherhash")
            .await
            .unwrap();
        assert!(replay.is_none());
    }
}
