//! Session middleware configuration.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions, plus small
//! helpers for reading and writing per-visitor state.

use serde::{Serialize, de::DeserializeOwned};
use sqlx::PgPool;
use tower_sessions::{Expiry, Session, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::StorefrontConfig;
use crate::models::session_keys;
use crate::services::admin_session::{MarkerError, MarkerStore};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "lustre_session";

/// Session expiry time in seconds (7 days of inactivity).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session layer with `PostgreSQL` store.
///
/// The `tower_sessions.session` table is created by `lustre-cli migrate`.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &StorefrontConfig,
) -> SessionManagerLayer<PostgresStore> {
    session_layer(PostgresStore::new(pool.clone()), config.is_https())
}

/// Session layer over any store. Tests use `tower_sessions::MemoryStore`.
#[must_use]
pub fn session_layer<S: SessionStore>(store: S, secure: bool) -> SessionManagerLayer<S> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Read a value from the session, falling back to its default when absent.
///
/// # Errors
///
/// Returns an error if the session store fails or the stored value no longer
/// deserializes.
pub async fn load_or_default<T>(
    session: &Session,
    key: &str,
) -> Result<T, tower_sessions::session::Error>
where
    T: DeserializeOwned + Default,
{
    Ok(session.get::<T>(key).await?.unwrap_or_default())
}

/// Write a value to the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn save<T: Serialize + Sync>(
    session: &Session,
    key: &str,
    value: &T,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(key, value).await
}

/// Admin marker kept in the visitor's server-side session.
#[derive(Debug, Clone)]
pub struct SessionMarkerStore {
    session: Session,
}

impl SessionMarkerStore {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }
}

impl MarkerStore for SessionMarkerStore {
    async fn get(&self) -> Result<Option<String>, MarkerError> {
        Ok(self.session.get::<String>(session_keys::ADMIN_MARKER).await?)
    }

    async fn set(&self, value: &str) -> Result<(), MarkerError> {
        // Rotate the session id on privilege change.
        self.session.cycle_id().await?;
        self.session.insert(session_keys::ADMIN_MARKER, value).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), MarkerError> {
        self.session
            .remove::<String>(session_keys::ADMIN_MARKER)
            .await?;
        Ok(())
    }
}
