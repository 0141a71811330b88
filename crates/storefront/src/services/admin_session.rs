//! Admin session store.
//!
//! Admin access is a single boolean backed by a persisted marker. The marker
//! has a fixed value and no expiry or signature: its presence alone means
//! "authenticated". On start-up the flag is seeded from the marker without
//! asking the verifier again.
//!
//! In the server the marker lives in the server-side session record, so the
//! client cannot forge it and it expires together with the session.

use std::future::Future;
use std::sync::Mutex;

use lustre_core::{Notification, Notifier};
use thiserror::Error;
use tracing::instrument;

use super::credentials::CredentialVerifier;

/// Value written to the marker on successful login.
pub const ADMIN_MARKER_VALUE: &str = "authenticated";

/// Failure reading or writing the persisted marker.
#[derive(Debug, Error)]
pub enum MarkerError {
    #[error("session store error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("marker storage unavailable: {0}")]
    Unavailable(String),
}

/// Key-value persistence for the admin marker.
pub trait MarkerStore {
    fn get(&self) -> impl Future<Output = Result<Option<String>, MarkerError>> + Send;

    fn set(&self, value: &str) -> impl Future<Output = Result<(), MarkerError>> + Send;

    fn clear(&self) -> impl Future<Output = Result<(), MarkerError>> + Send;
}

/// Process-local marker storage.
#[derive(Debug, Default)]
pub struct MemoryMarkerStore {
    value: Mutex<Option<String>>,
}

impl MemoryMarkerStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a marker already present.
    #[must_use]
    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: Mutex::new(Some(value.into())),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>, MarkerError> {
        self.value
            .lock()
            .map_err(|e| MarkerError::Unavailable(e.to_string()))
    }
}

impl MarkerStore for MemoryMarkerStore {
    async fn get(&self) -> Result<Option<String>, MarkerError> {
        Ok(self.lock()?.clone())
    }

    async fn set(&self, value: &str) -> Result<(), MarkerError> {
        *self.lock()? = Some(value.to_owned());
        Ok(())
    }

    async fn clear(&self) -> Result<(), MarkerError> {
        *self.lock()? = None;
        Ok(())
    }
}

impl<T: MarkerStore + Sync> MarkerStore for &T {
    fn get(&self) -> impl Future<Output = Result<Option<String>, MarkerError>> + Send {
        (**self).get()
    }

    fn set(&self, value: &str) -> impl Future<Output = Result<(), MarkerError>> + Send {
        (**self).set(value)
    }

    fn clear(&self) -> impl Future<Output = Result<(), MarkerError>> + Send {
        (**self).clear()
    }
}

/// Result of a login attempt.
///
/// `AdminSessionStore::login` collapses this to a boolean; callers that need
/// to tell a wrong password from an unreachable backend use `login_outcome`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    Authenticated,
    InvalidCredentials,
    VerifierUnavailable,
    /// Credentials were valid but the marker could not be saved.
    MarkerUnavailable,
}

impl LoginOutcome {
    #[must_use]
    pub const fn is_authenticated(self) -> bool {
        matches!(self, Self::Authenticated)
    }
}

/// Observable admin session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct AdminStatus {
    pub authenticated: bool,
    /// True until the initial marker check has completed.
    pub loading: bool,
}

/// Admin login state backed by a credential verifier and a marker store.
#[derive(Debug)]
pub struct AdminSessionStore<V, M, N> {
    verifier: V,
    marker: M,
    notifier: N,
    status: AdminStatus,
}

impl<V, M, N> AdminSessionStore<V, M, N>
where
    V: CredentialVerifier,
    M: MarkerStore,
    N: Notifier,
{
    /// Create a store in the loading state. Call [`Self::initialize`] next.
    pub const fn new(verifier: V, marker: M, notifier: N) -> Self {
        Self {
            verifier,
            marker,
            notifier,
            status: AdminStatus {
                authenticated: false,
                loading: true,
            },
        }
    }

    /// Create and initialize in one step.
    pub async fn load(verifier: V, marker: M, notifier: N) -> Self {
        let mut store = Self::new(verifier, marker, notifier);
        store.initialize().await;
        store
    }

    /// Seed the flag from marker presence. The verifier is not consulted.
    ///
    /// An unreadable marker counts as absent.
    pub async fn initialize(&mut self) {
        let present = match self.marker.get().await {
            Ok(marker) => marker.is_some(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read admin marker, treating as logged out");
                false
            }
        };
        self.status = AdminStatus {
            authenticated: present,
            loading: false,
        };
    }

    #[must_use]
    pub const fn status(&self) -> AdminStatus {
        self.status
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.status.authenticated
    }

    /// Check credentials and, if valid, persist the marker.
    ///
    /// Returns `true` only when the admin is now authenticated. Both a
    /// rejected password and an unavailable verifier return `false`; the
    /// notification text tells them apart.
    pub async fn login(&mut self, user_id: &str, password: &str) -> bool {
        self.login_outcome(user_id, password)
            .await
            .is_authenticated()
    }

    /// Same as [`Self::login`] but reports why a login failed.
    #[instrument(skip(self, password))]
    pub async fn login_outcome(&mut self, user_id: &str, password: &str) -> LoginOutcome {
        let outcome = match self.verifier.verify(user_id, password).await {
            Ok(true) => match self.marker.set(ADMIN_MARKER_VALUE).await {
                Ok(()) => {
                    self.status.authenticated = true;
                    LoginOutcome::Authenticated
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to persist admin marker");
                    LoginOutcome::MarkerUnavailable
                }
            },
            Ok(false) => LoginOutcome::InvalidCredentials,
            Err(e) => {
                tracing::warn!(error = %e, "Credential verification failed");
                LoginOutcome::VerifierUnavailable
            }
        };

        let notification = match outcome {
            LoginOutcome::Authenticated => Notification::success("Logged in as admin"),
            LoginOutcome::InvalidCredentials => Notification::error("Invalid user id or password"),
            LoginOutcome::VerifierUnavailable => Notification::error(
                "Login is temporarily unavailable, please try again later",
            ),
            LoginOutcome::MarkerUnavailable => {
                Notification::error("Could not start an admin session, please try again")
            }
        };
        self.notifier.notify(notification);

        outcome
    }

    /// Clear the marker and drop admin access.
    ///
    /// The flag follows the marker: if the marker could not be removed the
    /// store stays authenticated. The verifier is not informed.
    ///
    /// # Errors
    ///
    /// Returns `MarkerError` if the marker could not be removed.
    pub async fn logout(&mut self) -> Result<(), MarkerError> {
        self.marker.clear().await?;
        self.status.authenticated = false;
        self.notifier.notify(Notification::info("Logged out"));
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use lustre_core::NotificationLevel;

    use super::*;
    use crate::services::credentials::VerifyError;

    /// Verifier that accepts one fixed pair and counts calls.
    struct FakeVerifier {
        available: bool,
        calls: AtomicUsize,
    }

    impl FakeVerifier {
        const fn up() -> Self {
            Self {
                available: true,
                calls: AtomicUsize::new(0),
            }
        }

        const fn down() -> Self {
            Self {
                available: false,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl CredentialVerifier for FakeVerifier {
        async fn verify(&self, user_id: &str, password: &str) -> Result<bool, VerifyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.available {
                return Err(VerifyError::UnexpectedResponse("offline".to_string()));
            }
            Ok(user_id == "admin" && password == "opal-2024")
        }
    }

    /// Marker store whose writes always fail.
    struct BrokenMarker;

    impl MarkerStore for BrokenMarker {
        async fn get(&self) -> Result<Option<String>, MarkerError> {
            Err(MarkerError::Unavailable("disk gone".to_string()))
        }

        async fn set(&self, _value: &str) -> Result<(), MarkerError> {
            Err(MarkerError::Unavailable("disk gone".to_string()))
        }

        async fn clear(&self) -> Result<(), MarkerError> {
            Err(MarkerError::Unavailable("disk gone".to_string()))
        }
    }

    /// Marker that reads fine but cannot be removed.
    struct StuckMarker;

    impl MarkerStore for StuckMarker {
        async fn get(&self) -> Result<Option<String>, MarkerError> {
            Ok(Some(ADMIN_MARKER_VALUE.to_string()))
        }

        async fn set(&self, _value: &str) -> Result<(), MarkerError> {
            Ok(())
        }

        async fn clear(&self) -> Result<(), MarkerError> {
            Err(MarkerError::Unavailable("read-only".to_string()))
        }
    }

    fn quiet() -> Vec<Notification> {
        Vec::new()
    }

    #[tokio::test]
    async fn test_new_store_is_loading_until_initialized() {
        let marker = MemoryMarkerStore::new();
        let mut store = AdminSessionStore::new(FakeVerifier::up(), &marker, quiet());
        assert!(store.status().loading);
        store.initialize().await;
        assert_eq!(
            store.status(),
            AdminStatus {
                authenticated: false,
                loading: false
            }
        );
    }

    #[tokio::test]
    async fn test_login_persists_marker_and_reload_trusts_it() {
        let verifier = FakeVerifier::up();
        let marker = MemoryMarkerStore::new();
        let mut toasts: Vec<Notification> = Vec::new();

        let mut store = AdminSessionStore::load(&verifier, &marker, &mut toasts).await;
        assert!(store.login("admin", "opal-2024").await);
        assert!(store.is_authenticated());
        drop(store);

        assert_eq!(marker.get().await.unwrap().as_deref(), Some(ADMIN_MARKER_VALUE));
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].level, NotificationLevel::Success);
        assert_eq!(verifier.calls(), 1);

        let reloaded = AdminSessionStore::load(&verifier, &marker, quiet()).await;
        assert!(reloaded.is_authenticated());
        assert_eq!(verifier.calls(), 1);
    }

    #[tokio::test]
    async fn test_invalid_credentials_leave_state_unchanged() {
        let marker = MemoryMarkerStore::new();
        let mut toasts: Vec<Notification> = Vec::new();
        let mut store = AdminSessionStore::load(FakeVerifier::up(), &marker, &mut toasts).await;

        assert_eq!(
            store.login_outcome("admin", "wrong").await,
            LoginOutcome::InvalidCredentials
        );
        assert!(!store.is_authenticated());
        drop(store);

        assert_eq!(marker.get().await.unwrap(), None);
        assert_eq!(toasts[0].message, "Invalid user id or password");
    }

    #[tokio::test]
    async fn test_verifier_failure_returns_false_with_distinct_message() {
        let marker = MemoryMarkerStore::new();
        let mut toasts: Vec<Notification> = Vec::new();
        let mut store = AdminSessionStore::load(FakeVerifier::down(), &marker, &mut toasts).await;

        assert!(!store.login("admin", "opal-2024").await);
        assert!(!store.is_authenticated());
        drop(store);

        assert_eq!(toasts[0].level, NotificationLevel::Error);
        assert!(toasts[0].message.contains("temporarily unavailable"));
    }

    #[tokio::test]
    async fn test_failed_login_keeps_existing_session() {
        let marker = MemoryMarkerStore::with_value(ADMIN_MARKER_VALUE);
        let mut store = AdminSessionStore::load(FakeVerifier::down(), &marker, quiet()).await;
        assert!(store.is_authenticated());
        assert!(!store.login("admin", "opal-2024").await);
        assert!(store.is_authenticated());
    }

    #[tokio::test]
    async fn test_manually_set_marker_is_trusted() {
        let verifier = FakeVerifier::up();
        let marker = MemoryMarkerStore::with_value("anything");
        let store = AdminSessionStore::load(&verifier, &marker, quiet()).await;
        assert!(store.is_authenticated());
        assert_eq!(verifier.calls(), 0);
    }

    #[tokio::test]
    async fn test_logout_clears_marker_without_calling_verifier() {
        let verifier = FakeVerifier::up();
        let marker = MemoryMarkerStore::with_value(ADMIN_MARKER_VALUE);
        let mut store = AdminSessionStore::load(&verifier, &marker, quiet()).await;

        store.logout().await.unwrap();
        assert!(!store.is_authenticated());
        assert_eq!(marker.get().await.unwrap(), None);
        assert_eq!(verifier.calls(), 0);
    }

    #[tokio::test]
    async fn test_marker_write_failure_denies_login() {
        let mut store = AdminSessionStore::load(FakeVerifier::up(), BrokenMarker, quiet()).await;
        assert!(!store.status().loading);
        assert!(!store.is_authenticated());
        assert_eq!(
            store.login_outcome("admin", "opal-2024").await,
            LoginOutcome::MarkerUnavailable
        );
        assert!(!store.is_authenticated());
        assert!(store.logout().await.is_err());
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn test_failed_logout_keeps_flag_in_line_with_marker() {
        let mut toasts: Vec<Notification> = Vec::new();
        let mut store = AdminSessionStore::load(FakeVerifier::up(), StuckMarker, &mut toasts).await;
        assert!(store.is_authenticated());

        assert!(store.logout().await.is_err());
        assert!(store.is_authenticated());
        drop(store);
        assert!(toasts.is_empty());
    }
}
