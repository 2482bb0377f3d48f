//! Schema reset command.

use ecommerce_api::db::{MaintenanceStore, PgStore};

use super::{CommandError, connect};

/// Drop and recreate the `shop` schema. Identifiers restart at 1.
///
/// # Errors
///
/// Returns `CommandError::NotConfirmed` unless `confirmed` is set, or an
/// error if the database operation fails.
pub async fn run(confirmed: bool) -> Result<(), CommandError> {
    if !confirmed {
        return Err(CommandError::NotConfirmed("reset the database"));
    }

    let store = PgStore::new(connect().await?);
    store.reset().await?;

    tracing::info!("Database reset complete");
    Ok(())
}
