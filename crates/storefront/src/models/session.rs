//! Session-related types.
//!
//! Every visitor gets a server-side session record. The wishlist, the
//! checkout session, and the admin marker each live under their own key.

use lustre_core::Notification;
use serde::Serialize;

/// Session keys for per-visitor state.
pub mod keys {
    /// Key for the visitor's wishlist snapshot.
    pub const WISHLIST: &str = "wishlist";

    /// Key for the checkout session.
    pub const CHECKOUT: &str = "checkout";

    /// Key for the amount and description of the payment in progress.
    pub const PENDING_PAYMENT: &str = "pending_payment";

    /// Key for the admin marker.
    pub const ADMIN_MARKER: &str = "admin_marker";
}

/// JSON body returned by state-changing endpoints: the resulting state plus
/// any notifications raised while producing it.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    #[serde(flatten)]
    pub data: T,
    pub notifications: Vec<Notification>,
}

impl<T> ApiResponse<T> {
    pub const fn new(data: T, notifications: Vec<Notification>) -> Self {
        Self {
            data,
            notifications,
        }
    }
}
