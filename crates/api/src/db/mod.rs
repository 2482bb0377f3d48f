//! Storage for users, products, orders and their association.
//!
//! # Database: `PostgreSQL`, schema `shop`
//!
//! ## Tables
//!
//! - `users` - Customers
//! - `products` - Catalogue with non-negative `NUMERIC` prices
//! - `orders` - One row per order, `user_id` references `users` (RESTRICT)
//! - `order_products` - Join table keyed by `(order_id, product_id)`,
//!   cascades from both sides
//!
//! # Stores
//!
//! Handlers talk to the [`Store`] trait object held in
//! [`crate::state::AppState`]. Two implementations exist:
//!
//! - [`PgStore`] - `sqlx` over a connection pool. Multi-statement operations
//!   run in one transaction which rolls back when dropped on an error path.
//! - [`MemoryStore`] - ordered maps behind an async `RwLock`, for tests and
//!   local runs without a database.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p ecommerce-cli -- migrate
//! ```

pub mod memory;
pub mod orders;
pub mod products;
pub mod users;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use ecommerce_core::{OrderId, ProductId};

use crate::models::Resource;

pub use memory::MemoryStore;
pub use orders::OrderStore;
pub use products::ProductStore;
pub use users::UserStore;

/// Embedded migrations from `crates/api/migrations/`.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Drops the `shop` schema and replays its DDL. Sent as one simple query,
/// which `PostgreSQL` runs as a single implicit transaction.
const RESET_SQL: &str = concat!(
    "DROP SCHEMA IF EXISTS shop CASCADE;\n",
    include_str!("../../migrations/20261019000001_create_shop_schema.sql")
);

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// An entity an operation works on does not exist.
    #[error("{resource} {id} not found")]
    NotFound { resource: Resource, id: i32 },

    /// A foreign key points at a row that does not exist.
    #[error("constraint violation: {resource} {id} does not exist")]
    ForeignKey { resource: Resource, id: i32 },

    /// Any other constraint rejected the write (e.g. deleting a referenced row).
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// The product is already part of the order.
    #[error("product {product_id} is already in order {order_id}")]
    AlreadyAssociated {
        order_id: OrderId,
        product_id: ProductId,
    },

    /// The product is not part of the order.
    #[error("product {product_id} is not in order {order_id}")]
    NotAssociated {
        order_id: OrderId,
        product_id: ProductId,
    },
}

/// Everything a request handler needs from storage.
pub trait Store: UserStore + ProductStore + OrderStore + MaintenanceStore {}

impl<T> Store for T where T: UserStore + ProductStore + OrderStore + MaintenanceStore {}

/// Health and lifecycle operations on the whole store.
#[async_trait]
pub trait MaintenanceStore: Send + Sync {
    /// Check that the store can serve queries.
    async fn ping(&self) -> Result<(), RepositoryError>;

    /// Drop and recreate all storage. Identifiers restart at 1.
    async fn reset(&self) -> Result<(), RepositoryError>;
}

/// `PostgreSQL`-backed store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl MaintenanceStore for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn reset(&self) -> Result<(), RepositoryError> {
        sqlx::raw_sql(RESET_SQL).execute(&self.pool).await?;
        tracing::warn!("shop schema dropped and recreated");
        Ok(())
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
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

/// Returns `true` if `err` is a foreign key violation (`23503`).
pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation())
}
