//! Postgres store adapter.
//!
//! All queries are runtime-bound (`sqlx::query` + `bind`), so the crate
//! builds without a live database. Schema lives in `migrations/`.
//!
//! The contract's two atomicity requirements map directly onto Postgres:
//! `upsert_cart_item` is an `INSERT ... ON CONFLICT DO UPDATE`, and
//! `place_order` wraps order creation and cart cleanup in one transaction.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};

use thimble_core::{CartItemId, Cents, Email, ItemId, OrderId, OrderItemId, Permission, UserId};

use crate::models::{
    CartEntry, CartItem, Item, ItemChanges, ItemDraft, Order, OrderItem, OrderItemDraft, User,
};

use super::{Store, StoreError, StoreResult};

/// Create a Postgres connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// A [`Store`] backed by Postgres.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool, for health checks.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn permissions_from_row(row: &PgRow) -> StoreResult<BTreeSet<Permission>> {
    let names: Vec<String> = row.try_get("permissions")?;
    names
        .iter()
        .map(|name| {
            name.parse().map_err(|_| {
                StoreError::DataCorruption(format!("unknown permission in database: {name}"))
            })
        })
        .collect()
}

fn user_from_row(row: &PgRow) -> StoreResult<User> {
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        permissions: permissions_from_row(row)?,
        created_at: row.try_get("created_at")?,
    })
}

fn item_from_row(row: &PgRow) -> StoreResult<Item> {
    Ok(Item {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        image: row.try_get("image")?,
        large_image: row.try_get("large_image")?,
        price: row.try_get("price")?,
        user_id: row.try_get("user_id")?,
    })
}

fn cart_item_from_row(row: &PgRow) -> StoreResult<CartItem> {
    Ok(CartItem {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        item_id: row.try_get("item_id")?,
        quantity: row.try_get("quantity")?,
    })
}

fn order_item_from_row(row: &PgRow) -> StoreResult<OrderItem> {
    Ok(OrderItem {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        image: row.try_get("image")?,
        large_image: row.try_get("large_image")?,
        price: row.try_get("price")?,
        quantity: row.try_get("quantity")?,
    })
}

fn permission_names(permissions: &BTreeSet<Permission>) -> Vec<String> {
    permissions.iter().map(|p| p.as_str().to_owned()).collect()
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_user(
        &self,
        email: &Email,
        password_hash: &str,
        permissions: &BTreeSet<Permission>,
    ) -> StoreResult<User> {
        let row = sqlx::query(
            "INSERT INTO shop.user (email, password_hash, permissions)
             VALUES ($1, $2, $3)
             RETURNING id, email, permissions, created_at",
        )
        .bind(email)
        .bind(password_hash)
        .bind(permission_names(permissions))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return StoreError::Conflict("email already exists".to_owned());
            }
            StoreError::Database(e)
        })?;

        user_from_row(&row)
    }

    async fn user_by_id(&self, id: UserId) -> StoreResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, email, permissions, created_at FROM shop.user WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn user_by_email(&self, email: &Email) -> StoreResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, email, permissions, created_at FROM shop.user WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn user_with_password(&self, email: &Email) -> StoreResult<Option<(User, String)>> {
        let row = sqlx::query(
            "SELECT id, email, permissions, created_at, password_hash
             FROM shop.user WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let hash: String = row.try_get("password_hash")?;
        Ok(Some((user_from_row(&row)?, hash)))
    }

    async fn set_reset_token(
        &self,
        id: UserId,
        token: &str,
        expiry: DateTime<Utc>,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE shop.user SET reset_token = $1, reset_token_expiry = $2 WHERE id = $3",
        )
        .bind(token)
        .bind(expiry)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn consume_reset_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
        new_password_hash: &str,
    ) -> StoreResult<Option<User>> {
        // Single UPDATE makes the token single-use even under concurrent
        // redemption attempts.
        let row = sqlx::query(
            "UPDATE shop.user
             SET password_hash = $1, reset_token = NULL, reset_token_expiry = NULL
             WHERE reset_token = $2 AND reset_token_expiry >= $3
             RETURNING id, email, permissions, created_at",
        )
        .bind(new_password_hash)
        .bind(token)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn replace_permissions(
        &self,
        id: UserId,
        permissions: &BTreeSet<Permission>,
    ) -> StoreResult<User> {
        let row = sqlx::query(
            "UPDATE shop.user SET permissions = $1 WHERE id = $2
             RETURNING id, email, permissions, created_at",
        )
        .bind(permission_names(permissions))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let row = row.ok_or(StoreError::NotFound)?;
        user_from_row(&row)
    }

    async fn create_item(&self, draft: &ItemDraft, owner: UserId) -> StoreResult<Item> {
        let row = sqlx::query(
            "INSERT INTO shop.item (title, description, image, large_image, price, user_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id, title, description, image, large_image, price, user_id",
        )
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(&draft.image)
        .bind(&draft.large_image)
        .bind(draft.price)
        .bind(owner)
        .fetch_one(&self.pool)
        .await?;

        item_from_row(&row)
    }

    async fn item_by_id(&self, id: ItemId) -> StoreResult<Option<Item>> {
        let row = sqlx::query(
            "SELECT id, title, description, image, large_image, price, user_id
             FROM shop.item WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(item_from_row).transpose()
    }

    async fn update_item(&self, id: ItemId, changes: &ItemChanges) -> StoreResult<Item> {
        let row = sqlx::query(
            "UPDATE shop.item
             SET title = COALESCE($1, title),
                 description = COALESCE($2, description),
                 image = COALESCE($3, image),
                 large_image = COALESCE($4, large_image),
                 price = COALESCE($5, price)
             WHERE id = $6
             RETURNING id, title, description, image, large_image, price, user_id",
        )
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(&changes.image)
        .bind(&changes.large_image)
        .bind(changes.price)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let row = row.ok_or(StoreError::NotFound)?;
        item_from_row(&row)
    }

    async fn delete_item(&self, id: ItemId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM shop.item WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn items(&self, skip: u32, first: u32) -> StoreResult<Vec<Item>> {
        let rows = sqlx::query(
            "SELECT id, title, description, image, large_image, price, user_id
             FROM shop.item ORDER BY id ASC OFFSET $1 LIMIT $2",
        )
        .bind(i64::from(skip))
        .bind(i64::from(first))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(item_from_row).collect()
    }

    async fn items_count(&self) -> StoreResult<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM shop.item")
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = row.try_get("count")?;
        Ok(count.unsigned_abs())
    }

    async fn upsert_cart_item(&self, user: UserId, item: ItemId) -> StoreResult<CartItem> {
        let row = sqlx::query(
            "INSERT INTO shop.cart_item (user_id, item_id, quantity)
             VALUES ($1, $2, 1)
             ON CONFLICT (user_id, item_id)
             DO UPDATE SET quantity = shop.cart_item.quantity + 1
             RETURNING id, user_id, item_id, quantity",
        )
        .bind(user)
        .bind(item)
        .fetch_one(&self.pool)
        .await?;

        cart_item_from_row(&row)
    }

    async fn cart_item_by_id(&self, id: CartItemId) -> StoreResult<Option<CartItem>> {
        let row = sqlx::query(
            "SELECT id, user_id, item_id, quantity FROM shop.cart_item WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(cart_item_from_row).transpose()
    }

    async fn delete_cart_item(&self, id: CartItemId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM shop.cart_item WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn cart_for_user(&self, user: UserId) -> StoreResult<Vec<CartEntry>> {
        let rows = sqlx::query(
            "SELECT c.id AS cart_id, c.user_id, c.item_id, c.quantity,
                    i.id, i.title, i.description, i.image, i.large_image, i.price,
                    i.user_id AS item_user_id
             FROM shop.cart_item c
             JOIN shop.item i ON i.id = c.item_id
             WHERE c.user_id = $1
             ORDER BY c.id ASC",
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(CartEntry {
                    cart_item: CartItem {
                        id: row.try_get("cart_id")?,
                        user_id: row.try_get("user_id")?,
                        item_id: row.try_get("item_id")?,
                        quantity: row.try_get("quantity")?,
                    },
                    item: Item {
                        id: row.try_get("item_id")?,
                        title: row.try_get("title")?,
                        description: row.try_get("description")?,
                        image: row.try_get("image")?,
                        large_image: row.try_get("large_image")?,
                        price: row.try_get("price")?,
                        user_id: row.try_get("item_user_id")?,
                    },
                })
            })
            .collect()
    }

    async fn place_order(
        &self,
        user: UserId,
        total: Cents,
        charge_id: &str,
        items: &[OrderItemDraft],
        consumed: &[CartItemId],
    ) -> StoreResult<Order> {
        let mut tx = self.pool.begin().await?;

        let order_row = sqlx::query(
            "INSERT INTO shop.\"order\" (user_id, total, charge_id)
             VALUES ($1, $2, $3)
             RETURNING id, created_at",
        )
        .bind(user)
        .bind(total)
        .bind(charge_id)
        .fetch_one(&mut *tx)
        .await?;

        let order_id: OrderId = order_row.try_get("id")?;
        let created_at: DateTime<Utc> = order_row.try_get("created_at")?;

        let mut order_items = Vec::with_capacity(items.len());
        for draft in items {
            let row = sqlx::query(
                "INSERT INTO shop.order_item
                     (order_id, title, description, image, large_image, price, quantity)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)
                 RETURNING id",
            )
            .bind(order_id)
            .bind(&draft.title)
            .bind(&draft.description)
            .bind(&draft.image)
            .bind(&draft.large_image)
            .bind(draft.price)
            .bind(draft.quantity)
            .fetch_one(&mut *tx)
            .await?;

            let id: OrderItemId = row.try_get("id")?;
            order_items.push(OrderItem {
                id,
                title: draft.title.clone(),
                description: draft.description.clone(),
                image: draft.image.clone(),
                large_image: draft.large_image.clone(),
                price: draft.price,
                quantity: draft.quantity,
            });
        }

        let consumed_ids: Vec<i32> = consumed.iter().map(|id| id.as_i32()).collect();
        sqlx::query("DELETE FROM shop.cart_item WHERE id = ANY($1)")
            .bind(&consumed_ids)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Order {
            id: order_id,
            total,
            charge_id: charge_id.to_owned(),
            items: order_items,
            user_id: user,
            created_at,
        })
    }

    async fn order_by_id(&self, id: OrderId) -> StoreResult<Option<Order>> {
        let row = sqlx::query(
            "SELECT id, user_id, total, charge_id, created_at FROM shop.\"order\" WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let item_rows = sqlx::query(
            "SELECT id, title, description, image, large_image, price, quantity
             FROM shop.order_item WHERE order_id = $1 ORDER BY id ASC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(Order {
            id: row.try_get("id")?,
            total: row.try_get("total")?,
            charge_id: row.try_get("charge_id")?,
            items: item_rows
                .iter()
                .map(order_item_from_row)
                .collect::<StoreResult<_>>()?,
            user_id: row.try_get("user_id")?,
            created_at: row.try_get("created_at")?,
        }))
    }

    async fn orders_for_user(&self, user: UserId) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query(
            "SELECT id FROM shop.\"order\" WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let id: OrderId = row.try_get("id")?;
            if let Some(order) = self.order_by_id(id).await? {
                orders.push(order);
            }
        }
        Ok(orders)
    }
}
