//! One request at a time per session.
//!
//! Handlers load per-visitor state from the session, change it, and write it
//! back; tower-sessions persists the record after the handler returns. Two
//! overlapping requests on the same cookie would each start from the same
//! record and the later save would drop the earlier change. This layer sits
//! outside the session layer and holds a per-session mutex until the record
//! has been saved.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use moka::future::Cache;
use tokio::sync::Mutex;
use tower_sessions::cookie::Cookie;

use super::session::SESSION_COOKIE_NAME;

/// Entries idle this long are dropped. Far longer than any request.
const LOCK_IDLE_TIMEOUT: Duration = Duration::from_secs(600);

/// Per-session mutexes keyed by session cookie value.
#[derive(Clone)]
pub struct SessionLocks {
    locks: Cache<String, Arc<Mutex<()>>>,
}

impl SessionLocks {
    #[must_use]
    pub fn new() -> Self {
        Self {
            locks: Cache::builder().time_to_idle(LOCK_IDLE_TIMEOUT).build(),
        }
    }

    async fn lock_for(&self, session_id: String) -> Arc<Mutex<()>> {
        self.locks
            .get_with(session_id, async { Arc::new(Mutex::new(())) })
            .await
    }
}

impl Default for SessionLocks {
    fn default() -> Self {
        Self::new()
    }
}

/// Session cookie value from the request, if any.
fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
        .map(|cookie| cookie.value().to_owned())
        .filter(|value| !value.is_empty())
}

/// Serialize requests that carry the same session cookie.
///
/// Requests without a cookie get a fresh session and run unlocked.
pub async fn serialize_session_requests(
    State(locks): State<SessionLocks>,
    request: Request,
    next: Next,
) -> Response {
    let Some(session_id) = session_cookie(request.headers()) else {
        return next.run(request).await;
    };

    let lock = locks.lock_for(session_id).await;
    let _guard = lock.lock().await;
    next.run(request).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_finds_session_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; lustre_session=abc123; lang=en"),
        );
        assert_eq!(session_cookie(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_no_cookie_means_no_lock() {
        let mut headers = HeaderMap::new();
        assert!(session_cookie(&headers).is_none());

        headers.insert(header::COOKIE, HeaderValue::from_static("lustre_session="));
        assert!(session_cookie(&headers).is_none());
    }

    #[tokio::test]
    async fn test_same_session_shares_one_mutex() {
        let locks = SessionLocks::new();
        let first = locks.lock_for("abc".to_string()).await;
        let second = locks.lock_for("abc".to_string()).await;
        let other = locks.lock_for("xyz".to_string()).await;

        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &other));

        let _held = first.lock().await;
        assert!(second.try_lock().is_err());
        assert!(other.try_lock().is_ok());
    }
}
