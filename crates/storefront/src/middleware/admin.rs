//! Admin access extractor.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::session_keys;

/// Extractor that requires the admin marker to be present in the session.
///
/// # Example
///
/// ```rust,ignore
/// async fn admin_only(_admin: RequireAdmin) -> impl IntoResponse {
///     "ok"
/// }
/// ```
pub struct RequireAdmin;

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or_else(|| {
                AppError::Internal("session layer missing".to_string()).into_response()
            })?;

        let marker = session
            .get::<String>(session_keys::ADMIN_MARKER)
            .await
            .map_err(|e| AppError::Session(e).into_response())?;

        match marker {
            Some(_) => Ok(Self),
            None => Err(AppError::Unauthorized("admin login required".to_string()).into_response()),
        }
    }
}
