//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::db::ProfileRepository;
use crate::services::credentials::{SupabaseCredentialVerifier, VerifyError};
use crate::services::payment::HostedCheckoutGateway;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Per-visitor state (wishlist, checkout,
/// admin marker) is not kept here; it lives in the visitor's session.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    verifier: SupabaseCredentialVerifier,
    gateway: HostedCheckoutGateway,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the credential verifier cannot be built from the
    /// Supabase settings.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, VerifyError> {
        let verifier = SupabaseCredentialVerifier::new(&config.supabase)?;
        let gateway = HostedCheckoutGateway::new(&config.payment);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                verifier,
                gateway,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Repository over accounts and profiles.
    #[must_use]
    pub fn profiles(&self) -> ProfileRepository {
        ProfileRepository::new(self.inner.pool.clone())
    }

    #[must_use]
    pub fn verifier(&self) -> &SupabaseCredentialVerifier {
        &self.inner.verifier
    }

    #[must_use]
    pub fn gateway(&self) -> &HostedCheckoutGateway {
        &self.inner.gateway
    }
}
