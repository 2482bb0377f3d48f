//! Product repository for database operations.
//!
//! Prices are stored as `NUMERIC` and decoded back into [`Price`]; a negative
//! value coming out of the database is reported as data corruption.

use async_trait::async_trait;
use rust_decimal::Decimal;

use ecommerce_core::{NewProduct, Price, ProductId};

use super::{PgStore, RepositoryError};
use crate::models::Product;

/// Product persistence operations.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Insert a product and return it with its assigned ID.
    async fn create_product(&self, input: &NewProduct) -> Result<Product, RepositoryError>;

    /// All products, ordered by ID.
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError>;

    /// Get a product by ID. Returns `None` if it does not exist.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Replace a product's fields. Returns `None` if it does not exist.
    async fn update_product(
        &self,
        id: ProductId,
        input: &NewProduct,
    ) -> Result<Option<Product>, RepositoryError>;

    /// Delete a product and every association row that references it.
    ///
    /// Returns `false` if it did not exist.
    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError>;
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct ProductRow {
    id: ProductId,
    name: String,
    price: Decimal,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price for product {}: {e}", row.id))
        })?;

        Ok(Self {
            id: row.id,
            name: row.name,
            price,
        })
    }
}

/// Decode a batch of rows, failing on the first corrupt one.
pub(super) fn products_from_rows(rows: Vec<ProductRow>) -> Result<Vec<Product>, RepositoryError> {
    rows.into_iter().map(Product::try_from).collect()
}

#[async_trait]
impl ProductStore for PgStore {
    async fn create_product(&self, input: &NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO shop.products (name, price)
            VALUES ($1, $2)
            RETURNING id, name, price
            ",
        )
        .bind(&input.name)
        .bind(input.price.amount())
        .fetch_one(self.pool())
        .await?;

        row.try_into()
    }

    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, price
            FROM shop.products
            ORDER BY id
            ",
        )
        .fetch_all(self.pool())
        .await?;

        products_from_rows(rows)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, price
            FROM shop.products
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        row.map(Product::try_from).transpose()
    }

    async fn update_product(
        &self,
        id: ProductId,
        input: &NewProduct,
    ) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            UPDATE shop.products
            SET name = $2, price = $3
            WHERE id = $1
            RETURNING id, name, price
            ",
        )
        .bind(id)
        .bind(&input.name)
        .bind(input.price.amount())
        .fetch_optional(self.pool())
        .await?;

        row.map(Product::try_from).transpose()
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError> {
        // Association rows go with it through ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM shop.products WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
