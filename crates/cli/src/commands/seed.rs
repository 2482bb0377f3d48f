//! Seed the database from a YAML fixture.
//!
//! ```yaml
//! users:
//!   - name: Ada
//!     address: 1 Analytical Way
//!     email: ada@example.com
//! products:
//!   - name: Difference Engine
//!     price: 1999.99
//! ```
//!
//! Every entry goes through the same validation as the HTTP API. The whole
//! file is validated before anything is written.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use ecommerce_api::db::{PgStore, ProductStore, UserStore};
use ecommerce_core::{FromPayload, NewProduct, NewUser};

use super::{CommandError, connect};

#[derive(Debug, Default, Deserialize)]
struct SeedFile {
    #[serde(default)]
    users: Vec<Value>,
    #[serde(default)]
    products: Vec<Value>,
}

/// Validated fixture contents.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedData {
    pub users: Vec<NewUser>,
    pub products: Vec<NewProduct>,
}

/// Counts of inserted rows.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub products: usize,
}

fn validate_section<T: FromPayload>(
    section: &'static str,
    entries: &[Value],
) -> Result<Vec<T>, CommandError> {
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            T::from_payload(entry).map_err(|errors| CommandError::InvalidEntry {
                section,
                index,
                errors,
            })
        })
        .collect()
}

/// Parse and validate fixture text.
///
/// # Errors
///
/// Returns an error for malformed YAML or the first invalid entry.
pub fn parse(content: &str) -> Result<SeedData, CommandError> {
    // An empty document deserializes as unit, not as an empty mapping.
    if content.trim().is_empty() {
        return Ok(SeedData::default());
    }

    let file: SeedFile = serde_yaml::from_str(content)?;
    Ok(SeedData {
        users: validate_section("users", &file.users)?,
        products: validate_section("products", &file.products)?,
    })
}

/// Seed users and products from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or validated, or if a
/// database operation fails.
pub async fn run(path: &Path) -> Result<SeedSummary, CommandError> {
    tracing::info!(path = %path.display(), "Loading fixture");

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CommandError::Io {
            path: path.display().to_string(),
            source,
        })?;
    let data = parse(&content)?;

    tracing::info!(
        users = data.users.len(),
        products = data.products.len(),
        "Fixture validated"
    );

    let store = PgStore::new(connect().await?);
    let mut summary = SeedSummary::default();

    for user in &data.users {
        store.create_user(user).await?;
        summary.users += 1;
    }
    for product in &data.products {
        store.create_product(product).await?;
        summary.products += 1;
    }

    Ok(summary)
}
