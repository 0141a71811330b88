//! Admin route handlers.
//!
//! Each request builds an `AdminSessionStore` over the visitor's session
//! marker. Initialization reads the marker only; the credential verifier is
//! called from `login` and nowhere else.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use lustre_core::Notification;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::db::ProfileRepository;
use crate::error::{Result, add_breadcrumb};
use crate::middleware::{RequireAdmin, SessionMarkerStore};
use crate::models::ApiResponse;
use crate::services::admin_session::{AdminSessionStore, AdminStatus, LoginOutcome};
use crate::services::credentials::SupabaseCredentialVerifier;
use crate::services::profile_sync::{SyncReport, sync_profiles};
use crate::state::AppState;

type Store<'a> = AdminSessionStore<
    &'a SupabaseCredentialVerifier,
    SessionMarkerStore,
    &'a mut Vec<Notification>,
>;

async fn open<'a>(
    state: &'a AppState,
    session: &Session,
    notifications: &'a mut Vec<Notification>,
) -> Store<'a> {
    AdminSessionStore::load(
        state.verifier(),
        SessionMarkerStore::new(session.clone()),
        notifications,
    )
    .await
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub user_id: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SyncParams {
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    #[serde(flatten)]
    pub status: AdminStatus,
}

/// Current admin session state.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Json<SessionView> {
    let mut notifications = Vec::new();
    let store = open(&state, &session, &mut notifications).await;
    Json(SessionView {
        status: store.status(),
    })
}

/// Log in with a user id and password.
///
/// Status reflects the outcome: 200 authenticated, 401 rejected, 503 when
/// the verifier could not be reached, 500 when the marker could not be
/// saved. The body always carries the session state and notifications.
#[instrument(skip(state, session, request), fields(user_id = %request.user_id))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<LoginRequest>,
) -> Response {
    let mut notifications = Vec::new();
    let mut store = open(&state, &session, &mut notifications).await;
    let outcome = store
        .login_outcome(&request.user_id, &request.password)
        .await;
    let status = store.status();
    drop(store);

    let code = match outcome {
        LoginOutcome::Authenticated => {
            add_breadcrumb("admin", "Admin logged in", &[("user_id", request.user_id)]);
            StatusCode::OK
        }
        LoginOutcome::InvalidCredentials => StatusCode::UNAUTHORIZED,
        LoginOutcome::VerifierUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        LoginOutcome::MarkerUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (
        code,
        Json(ApiResponse::new(SessionView { status }, notifications)),
    )
        .into_response()
}

/// Log out. The verifier is not informed.
#[instrument(skip(state, session))]
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<ApiResponse<SessionView>>> {
    let mut notifications = Vec::new();
    let mut store = open(&state, &session, &mut notifications).await;
    store.logout().await?;
    let status = store.status();
    drop(store);

    Ok(Json(ApiResponse::new(SessionView { status }, notifications)))
}

/// Insert profiles for accounts that have none.
#[instrument(skip(state, _admin))]
pub async fn run_profile_sync(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Query(params): Query<SyncParams>,
) -> Result<Json<SyncReport>> {
    let repository: ProfileRepository = state.profiles();
    let report = sync_profiles(&repository, params.dry_run).await?;
    add_breadcrumb(
        "admin",
        "Profile sync",
        &[("inserted", report.inserted.to_string())],
    );
    Ok(Json(report))
}
