//! Database operations for the storefront `PostgreSQL`.
//!
//! The storefront database is the Supabase Postgres instance that also backs
//! authentication, so this module reads from two schemas:
//!
//! ## Tables
//!
//! - `auth.users` - Accounts managed by Supabase Auth (read-only here)
//! - `public.profiles` - Shop profile per account
//! - `tower_sessions.session` - Tower-sessions storage (wishlist, checkout, admin marker)
//!
//! # Migrations
//!
//! The session table is created via:
//! ```bash
//! cargo run -p lustre-cli -- migrate
//! ```

pub mod profiles;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use profiles::ProfileRepository;

/// Errors raised by repositories.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Query or connection failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A row did not have the shape the repository expects.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
