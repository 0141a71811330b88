//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `admin_session` - Admin login state backed by a persisted marker
//! - `credentials` - Remote admin credential verification
//! - `payment` - Hosted payment gateway handoff
//! - `profile_sync` - Reconcile accounts with profile records

pub mod admin_session;
pub mod credentials;
pub mod payment;
pub mod profile_sync;

pub use admin_session::{
    ADMIN_MARKER_VALUE, AdminSessionStore, AdminStatus, LoginOutcome, MarkerError, MarkerStore,
    MemoryMarkerStore,
};
pub use credentials::{CredentialVerifier, SupabaseCredentialVerifier, VerifyError};
pub use payment::{CheckoutPayload, HostedCheckoutGateway, PaymentError, PaymentGateway};
pub use profile_sync::{ProfileDirectory, SyncError, SyncReport, sync_profiles};
