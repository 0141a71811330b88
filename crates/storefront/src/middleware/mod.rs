//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP context)
//! 2. Session lock (one request at a time per session cookie)
//! 3. Session layer (tower-sessions with `PostgreSQL` store)
//! 4. `TraceLayer` (request span)
//! 5. Request ID
//! 6. Security headers

pub mod admin;
pub mod request_id;
pub mod security_headers;
pub mod session;
pub mod session_lock;

pub use admin::RequireAdmin;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{SessionMarkerStore, create_session_layer, session_layer};
pub use session_lock::{SessionLocks, serialize_session_requests};
