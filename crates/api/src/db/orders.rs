//! Order repository for database operations.
//!
//! Covers orders themselves, the `order_products` association, and the two
//! relationship queries (orders of a user, products of an order).
//!
//! Association changes check that both sides exist and then write the join
//! row inside a single transaction. The insert uses `ON CONFLICT DO NOTHING`,
//! so two concurrent adds of the same pair still produce one row and one
//! `AlreadyAssociated` error.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use ecommerce_core::{NewOrder, OrderChanges, OrderId, ProductId, UserId};

use super::products::{ProductRow, products_from_rows};
use super::{PgStore, RepositoryError, is_foreign_key_violation};
use crate::models::{Order, Product, Resource};

/// Order and association persistence operations.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert an order for an existing user.
    ///
    /// Returns `RepositoryError::ForeignKey` if the user does not exist; in
    /// that case nothing is written.
    async fn create_order(&self, input: &NewOrder) -> Result<Order, RepositoryError>;

    /// All orders, ordered by ID.
    async fn list_orders(&self) -> Result<Vec<Order>, RepositoryError>;

    /// Get an order by ID. Returns `None` if it does not exist.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// Change the mutable fields of an order. Returns `None` if it does not exist.
    async fn update_order(
        &self,
        id: OrderId,
        changes: &OrderChanges,
    ) -> Result<Option<Order>, RepositoryError>;

    /// Delete an order and its association rows. Returns `false` if it did not exist.
    async fn delete_order(&self, id: OrderId) -> Result<bool, RepositoryError>;

    /// Link a product to an order.
    ///
    /// # Errors
    ///
    /// - `RepositoryError::NotFound` if the order or the product does not exist
    /// - `RepositoryError::AlreadyAssociated` if the pair is already linked
    async fn add_product_to_order(
        &self,
        order_id: OrderId,
        product_id: ProductId,
    ) -> Result<(), RepositoryError>;

    /// Unlink a product from an order.
    ///
    /// # Errors
    ///
    /// - `RepositoryError::NotFound` if the order or the product does not exist
    /// - `RepositoryError::NotAssociated` if the pair is not linked
    async fn remove_product_from_order(
        &self,
        order_id: OrderId,
        product_id: ProductId,
    ) -> Result<(), RepositoryError>;

    /// Orders owned by a user, ordered by ID. Returns `None` if the user does not exist.
    async fn list_orders_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<Vec<Order>>, RepositoryError>;

    /// Products linked to an order, ordered by ID. Returns `None` if the order does not exist.
    async fn list_products_for_order(
        &self,
        order_id: OrderId,
    ) -> Result<Option<Vec<Product>>, RepositoryError>;
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    order_date: DateTime<Utc>,
    user_id: UserId,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            order_date: row.order_date,
            user_id: row.user_id,
        }
    }
}

/// Check that a row exists, locking it against concurrent deletes until commit.
async fn row_exists(
    conn: &mut PgConnection,
    resource: Resource,
    id: i32,
) -> Result<bool, RepositoryError> {
    let sql = match resource {
        Resource::User => "SELECT 1 FROM shop.users WHERE id = $1 FOR SHARE",
        Resource::Product => "SELECT 1 FROM shop.products WHERE id = $1 FOR SHARE",
        Resource::Order => "SELECT 1 FROM shop.orders WHERE id = $1 FOR SHARE",
    };

    let row = sqlx::query(sql).bind(id).fetch_optional(conn).await?;
    Ok(row.is_some())
}

/// Fail with `NotFound` unless the order and the product both exist.
async fn ensure_pair_exists(
    conn: &mut PgConnection,
    order_id: OrderId,
    product_id: ProductId,
) -> Result<(), RepositoryError> {
    if !row_exists(conn, Resource::Order, order_id.as_i32()).await? {
        return Err(RepositoryError::NotFound {
            resource: Resource::Order,
            id: order_id.as_i32(),
        });
    }
    if !row_exists(conn, Resource::Product, product_id.as_i32()).await? {
        return Err(RepositoryError::NotFound {
            resource: Resource::Product,
            id: product_id.as_i32(),
        });
    }
    Ok(())
}

#[async_trait]
impl OrderStore for PgStore {
    async fn create_order(&self, input: &NewOrder) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            INSERT INTO shop.orders (user_id, order_date)
            VALUES ($1, COALESCE($2, now()))
            RETURNING id, order_date, user_id
            ",
        )
        .bind(input.user_id)
        .bind(input.order_date)
        .fetch_one(self.pool())
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                return RepositoryError::ForeignKey {
                    resource: Resource::User,
                    id: input.user_id.as_i32(),
                };
            }
            RepositoryError::Database(e)
        })?;

        Ok(row.into())
    }

    async fn list_orders(&self) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, order_date, user_id
            FROM shop.orders
            ORDER BY id
            ",
        )
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Order::from).collect())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, order_date, user_id
            FROM shop.orders
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(Order::from))
    }

    async fn update_order(
        &self,
        id: OrderId,
        changes: &OrderChanges,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            UPDATE shop.orders
            SET order_date = $2
            WHERE id = $1
            RETURNING id, order_date, user_id
            ",
        )
        .bind(id)
        .bind(changes.order_date)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(Order::from))
    }

    async fn delete_order(&self, id: OrderId) -> Result<bool, RepositoryError> {
        // Association rows go with it through ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM shop.orders WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn add_product_to_order(
        &self,
        order_id: OrderId,
        product_id: ProductId,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool().begin().await?;
        ensure_pair_exists(&mut tx, order_id, product_id).await?;

        let result = sqlx::query(
            r"
            INSERT INTO shop.order_products (order_id, product_id)
            VALUES ($1, $2)
            ON CONFLICT (order_id, product_id) DO NOTHING
            ",
        )
        .bind(order_id)
        .bind(product_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::AlreadyAssociated {
                order_id,
                product_id,
            });
        }

        tx.commit().await?;
        Ok(())
    }

    async fn remove_product_from_order(
        &self,
        order_id: OrderId,
        product_id: ProductId,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool().begin().await?;
        ensure_pair_exists(&mut tx, order_id, product_id).await?;

        let result = sqlx::query(
            r"
            DELETE FROM shop.order_products
            WHERE order_id = $1 AND product_id = $2
            ",
        )
        .bind(order_id)
        .bind(product_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotAssociated {
                order_id,
                product_id,
            });
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_orders_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<Vec<Order>>, RepositoryError> {
        let mut tx = self.pool().begin().await?;
        if !row_exists(&mut tx, Resource::User, user_id.as_i32()).await? {
            return Ok(None);
        }

        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, order_date, user_id
            FROM shop.orders
            WHERE user_id = $1
            ORDER BY id
            ",
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(rows.into_iter().map(Order::from).collect()))
    }

    async fn list_products_for_order(
        &self,
        order_id: OrderId,
    ) -> Result<Option<Vec<Product>>, RepositoryError> {
        let mut tx = self.pool().begin().await?;
        if !row_exists(&mut tx, Resource::Order, order_id.as_i32()).await? {
            return Ok(None);
        }

        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT p.id, p.name, p.price
            FROM shop.products p
            JOIN shop.order_products op ON op.product_id = p.id
            WHERE op.order_id = $1
            ORDER BY p.id
            ",
        )
        .bind(order_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(products_from_rows(rows)?))
    }
}
