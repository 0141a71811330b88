//! Session store migration.
//!
//! Creates the `tower_sessions` schema and `session` table used by the
//! storefront's session layer. Safe to run repeatedly.

use tower_sessions_sqlx_store::PostgresStore;

use super::{CommandError, connect};

/// Run the session store migration.
pub async fn sessions() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running session store migration...");
    PostgresStore::new(pool)
        .migrate()
        .await
        .map_err(CommandError::Migration)?;

    tracing::info!("Session store migration complete!");
    Ok(())
}
