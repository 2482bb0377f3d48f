//! Database migration command.
//!
//! Migrations live in `crates/api/migrations/` and are embedded in the API
//! crate as [`ecommerce_api::db::MIGRATOR`].

use ecommerce_api::db::MIGRATOR;

use super::{CommandError, connect};

/// Apply every pending migration.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    MIGRATOR.run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
