//! CLI command implementations.

pub mod migrate;
pub mod sync;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Session table migration failed.
    #[error("Session store migration failed: {0}")]
    Migration(#[source] sqlx::Error),

    /// Profile sync failed.
    #[error(transparent)]
    Sync(#[from] lustre_storefront::services::SyncError),

    /// The report could not be printed.
    #[error("Failed to serialize report: {0}")]
    Report(#[from] serde_json::Error),
}

/// Resolve the storefront database URL from the environment.
fn database_url() -> Result<SecretString, CommandError> {
    let _ = dotenvy::dotenv();
    std::env::var("STOREFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("STOREFRONT_DATABASE_URL"))
}

/// Connect to the storefront database.
async fn connect() -> Result<PgPool, CommandError> {
    tracing::info!("Connecting to storefront database...");
    Ok(lustre_storefront::db::create_pool(&database_url()?).await?)
}
