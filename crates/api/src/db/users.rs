//! User repository for database operations.
//!
//! Users are created and updated from a validated [`NewUser`]. Deleting a
//! user that still owns orders is refused by the `RESTRICT` foreign key on
//! `shop.orders.user_id`.

use async_trait::async_trait;

use ecommerce_core::{NewUser, UserId};

use super::{PgStore, RepositoryError, is_foreign_key_violation};
use crate::models::User;

/// User persistence operations.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user and return it with its assigned ID.
    async fn create_user(&self, input: &NewUser) -> Result<User, RepositoryError>;

    /// All users, ordered by ID.
    async fn list_users(&self) -> Result<Vec<User>, RepositoryError>;

    /// Get a user by ID. Returns `None` if it does not exist.
    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Replace a user's fields. Returns `None` if it does not exist.
    async fn update_user(
        &self,
        id: UserId,
        input: &NewUser,
    ) -> Result<Option<User>, RepositoryError>;

    /// Delete a user.
    ///
    /// Returns `false` if it did not exist, and
    /// `RepositoryError::ConstraintViolation` if it still owns orders.
    async fn delete_user(&self, id: UserId) -> Result<bool, RepositoryError>;
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: UserId,
    name: String,
    address: String,
    email: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            address: row.address,
            email: row.email,
        }
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, input: &NewUser) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO shop.users (name, address, email)
            VALUES ($1, $2, $3)
            RETURNING id, name, address, email
            ",
        )
        .bind(&input.name)
        .bind(&input.address)
        .bind(&input.email)
        .fetch_one(self.pool())
        .await?;

        Ok(row.into())
    }

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, name, address, email
            FROM shop.users
            ORDER BY id
            ",
        )
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, name, address, email
            FROM shop.users
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(User::from))
    }

    async fn update_user(
        &self,
        id: UserId,
        input: &NewUser,
    ) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            UPDATE shop.users
            SET name = $2, address = $3, email = $4
            WHERE id = $1
            RETURNING id, name, address, email
            ",
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.address)
        .bind(&input.email)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(User::from))
    }

    async fn delete_user(&self, id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.users WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    return RepositoryError::ConstraintViolation(format!(
                        "User {id} still has orders"
                    ));
                }
                RepositoryError::Database(e)
            })?;

        Ok(result.rows_affected() > 0)
    }
}
