//! CLI subcommands.

pub mod migrate;
pub mod reset;
pub mod seed;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use ecommerce_api::db::{self, RepositoryError};
use ecommerce_core::ValidationErrors;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Store operation failed.
    #[error("Store error: {0}")]
    Repository(#[from] RepositoryError),

    /// Fixture file could not be read.
    #[error("Could not read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// Fixture file is not valid YAML.
    #[error("Invalid fixture: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A fixture entry failed validation.
    #[error("Invalid {section}[{index}]: {errors}")]
    InvalidEntry {
        section: &'static str,
        index: usize,
        errors: ValidationErrors,
    },

    /// A destructive command ran without confirmation.
    #[error("Refusing to {0} without --yes")]
    NotConfirmed(&'static str),
}

/// Database URL from `API_DATABASE_URL`, falling back to `DATABASE_URL`.
fn database_url() -> Result<SecretString, CommandError> {
    dotenvy::dotenv().ok();

    std::env::var("API_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("API_DATABASE_URL"))
}

/// Connect to the database named by the environment.
async fn connect() -> Result<PgPool, CommandError> {
    let url = database_url()?;
    tracing::info!("Connecting to database...");
    Ok(db::create_pool(&url).await?)
}
