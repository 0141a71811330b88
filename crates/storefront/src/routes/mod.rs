//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                      - Liveness
//! GET    /health/ready                - Readiness (database)
//!
//! # Wishlist
//! GET    /wishlist                    - Items and count
//! POST   /wishlist                    - Add item
//! GET    /wishlist/{id}               - Membership check
//! DELETE /wishlist/{id}               - Remove item
//!
//! # Checkout
//! GET    /checkout                    - Session and offered actions
//! POST   /checkout/advance            - Next stage
//! POST   /checkout/back               - Previous stage
//! POST   /checkout/restart            - Start over
//! POST   /checkout/pay                - Begin payment, returns redirect URL
//! POST   /checkout/retry              - Retry a failed payment
//! POST   /checkout/back-to-checkout   - Abandon the failed attempt
//! GET    /checkout/return             - Gateway redirect-back
//!
//! # Admin
//! GET    /admin/session               - Authenticated / loading
//! POST   /admin/login                 - Log in
//! POST   /admin/logout                - Log out
//! POST   /admin/profiles/sync         - Profile sync (admin only)
//! ```

pub mod admin;
pub mod checkout;
pub mod wishlist;

use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::middleware::{request_id_middleware, security_headers_middleware};
use crate::state::AppState;

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::show).post(wishlist::add))
        .route("/{id}", get(wishlist::contains).delete(wishlist::remove))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show))
        .route("/advance", post(checkout::advance))
        .route("/back", post(checkout::back))
        .route("/restart", post(checkout::restart))
        .route("/pay", post(checkout::pay))
        .route("/retry", post(checkout::retry))
        .route("/back-to-checkout", post(checkout::back_to_checkout))
        .route("/return", get(checkout::return_from_gateway))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/session", get(admin::show))
        .route("/login", post(admin::login))
        .route("/logout", post(admin::logout))
        .route("/profiles/sync", post(admin::run_profile_sync))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/wishlist", wishlist_routes())
        .nest("/checkout", checkout_routes())
        .nest("/admin", admin_routes())
}

/// Routes with request-scoped middleware, without the session layer.
///
/// The binary adds the `PostgreSQL` session layer and Sentry layers on top;
/// tests add a memory-backed session layer instead.
pub fn app(state: AppState) -> Router {
    routes()
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
