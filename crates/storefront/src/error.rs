//! Unified error handling with Sentry integration.
//!
//! Every route handler returns `Result<T, AppError>`. A failure is contained
//! to the response of the route that produced it; the rest of the API stays
//! usable. Server-class errors are captured to Sentry before responding.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use lustre_core::CheckoutError;
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::admin_session::MarkerError;
use crate::services::payment::PaymentError;
use crate::services::profile_sync::SyncError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Session store read or write failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// The requested checkout transition is not allowed right now.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// The payment handoff could not be built.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// The admin marker could not be read or written.
    #[error("Admin session error: {0}")]
    Marker(#[from] MarkerError),

    /// Profile reconciliation failed.
    #[error("Profile sync error: {0}")]
    Sync(#[from] SyncError),

    /// Caller is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Payment(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            Self::Database(_)
            | Self::Session(_)
            | Self::Marker(_)
            | Self::Sync(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Checkout(_) => StatusCode::CONFLICT,
            Self::Payment(_) => StatusCode::BAD_GATEWAY,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Database(_)
                | Self::Session(_)
                | Self::Marker(_)
                | Self::Sync(_)
                | Self::Internal(_)
        ) || matches!(self, Self::Payment(err) if !err.is_client_error())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(_) | Self::Session(_) | Self::Marker(_) | Self::Internal(_) => {
                "Internal server error".to_string()
            }
            Self::Sync(_) => "Profile sync failed".to_string(),
            Self::Payment(err) if err.is_client_error() => err.to_string(),
            Self::Payment(_) => "Payment service error".to_string(),
            Self::Checkout(err) => err.to_string(),
            _ => self.to_string(),
        };

        (self.status(), Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for shopper or admin actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, String)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb
            .data
            .insert((*key).to_string(), serde_json::Value::String(value.clone()));
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use lustre_core::CheckoutStage;

    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::BadRequest("no payment to retry".to_string());
        assert_eq!(err.to_string(), "Bad request: no payment to retry");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::Checkout(CheckoutError::RetryLimitReached)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Checkout(CheckoutError::NotAtPaymentStage(
                CheckoutStage::Cart
            ))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Unauthorized("admin".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::BadRequest("bad".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Payment(PaymentError::InvalidAmount)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Payment(PaymentError::Url(
                url::ParseError::EmptyHost
            ))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(AppError::Internal("boom".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
