//! Checkout route handlers.
//!
//! The checkout session is stored in the visitor's session. Payment is a
//! redirect handoff: `pay` and `retry` return the hosted checkout URL, and
//! the gateway reports back through `return_from_gateway`.

use axum::{
    Json,
    extract::{Query, State},
};
use lustre_core::{
    AvailableActions, CheckoutSession, CheckoutStage, CurrencyCode, GatewayOutcome, Notification,
    PaymentReference, PaymentStatus, Price,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::session::{load_or_default, save};
use crate::models::{ApiResponse, session_keys};
use crate::services::payment::{CheckoutPayload, PaymentGateway};
use crate::state::AppState;

/// Message recorded when the gateway reports a failure without a reason.
const DEFAULT_FAILURE_MESSAGE: &str = "Payment was declined";

/// Amount and description of the order being paid, kept so that a retry
/// can rebuild the gateway handoff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingPayment {
    pub amount: Price,
    pub description: String,
}

/// Checkout session as returned to the client.
#[derive(Debug, Serialize)]
pub struct CheckoutView {
    pub stage: CheckoutStage,
    pub step: u8,
    pub status: PaymentStatus,
    pub retry_count: u8,
    pub retries_remaining: u8,
    pub last_error: Option<String>,
    pub reference: Option<PaymentReference>,
    pub actions: AvailableActions,
    /// Where to send the shopper next, set while a payment is starting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
}

impl From<&CheckoutSession> for CheckoutView {
    fn from(checkout: &CheckoutSession) -> Self {
        Self {
            stage: checkout.stage(),
            step: checkout.stage().step_number(),
            status: checkout.status(),
            retry_count: checkout.retry_count(),
            retries_remaining: checkout.retries_remaining(),
            last_error: checkout.last_error().map(String::from),
            reference: checkout.reference(),
            actions: checkout.actions(),
            redirect_url: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PayRequest {
    pub amount: Decimal,
    /// Defaults to the gateway's currency.
    pub currency: Option<CurrencyCode>,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct GatewayReturn {
    pub reference: PaymentReference,
    pub status: GatewayOutcome,
    pub message: Option<String>,
}

async fn load(session: &Session) -> Result<CheckoutSession> {
    Ok(load_or_default(session, session_keys::CHECKOUT).await?)
}

async fn store(session: &Session, checkout: &CheckoutSession) -> Result<()> {
    Ok(save(session, session_keys::CHECKOUT, checkout).await?)
}

fn respond(
    checkout: &CheckoutSession,
    notifications: Vec<Notification>,
) -> Json<ApiResponse<CheckoutView>> {
    Json(ApiResponse::new(CheckoutView::from(checkout), notifications))
}

/// Current checkout session and the actions on offer.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<Json<CheckoutView>> {
    let checkout = load(&session).await?;
    Ok(Json(CheckoutView::from(&checkout)))
}

/// Move to the next stage.
#[instrument(skip(session))]
pub async fn advance(session: Session) -> Result<Json<ApiResponse<CheckoutView>>> {
    let mut checkout = load(&session).await?;
    checkout.advance()?;
    store(&session, &checkout).await?;
    Ok(respond(&checkout, Vec::new()))
}

/// Move to the previous stage.
#[instrument(skip(session))]
pub async fn back(session: Session) -> Result<Json<ApiResponse<CheckoutView>>> {
    let mut checkout = load(&session).await?;
    checkout.back()?;
    store(&session, &checkout).await?;
    Ok(respond(&checkout, Vec::new()))
}

/// Abandon the session and start again at the cart.
#[instrument(skip(session))]
pub async fn restart(session: Session) -> Result<Json<ApiResponse<CheckoutView>>> {
    let mut checkout = load(&session).await?;
    checkout.restart();
    store(&session, &checkout).await?;
    session
        .remove::<PendingPayment>(session_keys::PENDING_PAYMENT)
        .await?;
    Ok(respond(
        &checkout,
        vec![Notification::info("Checkout restarted")],
    ))
}

/// Start a payment and return the gateway redirect.
#[instrument(skip(state, session, request), fields(amount = %request.amount))]
pub async fn pay(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<PayRequest>,
) -> Result<Json<ApiResponse<CheckoutView>>> {
    let gateway = state.gateway();
    let amount = Price::new(
        request.amount,
        request.currency.unwrap_or_else(|| gateway.currency()),
    );
    gateway.validate(&amount)?;

    let mut checkout = load(&session).await?;
    let reference = checkout.begin_payment()?;

    let pending = PendingPayment {
        amount,
        description: request.description,
    };
    save(&session, session_keys::PENDING_PAYMENT, &pending).await?;

    add_breadcrumb(
        "checkout",
        "Payment started",
        &[("reference", reference.to_string())],
    );
    hand_off(&state, &session, checkout, reference, &pending).await
}

/// Retry a failed payment, at most three failures per session.
#[instrument(skip(state, session))]
pub async fn retry(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<ApiResponse<CheckoutView>>> {
    let mut checkout = load(&session).await?;
    let pending: PendingPayment = session
        .get(session_keys::PENDING_PAYMENT)
        .await?
        .ok_or_else(|| AppError::BadRequest("no payment to retry".to_string()))?;

    let reference = checkout.retry()?;
    add_breadcrumb(
        "checkout",
        "Payment retried",
        &[
            ("reference", reference.to_string()),
            ("retry_count", checkout.retry_count().to_string()),
        ],
    );
    hand_off(&state, &session, checkout, reference, &pending).await
}

/// Give up on the failed attempt and return to the payment form.
#[instrument(skip(session))]
pub async fn back_to_checkout(session: Session) -> Result<Json<ApiResponse<CheckoutView>>> {
    let mut checkout = load(&session).await?;
    checkout.back_to_checkout()?;
    store(&session, &checkout).await?;
    Ok(respond(&checkout, Vec::new()))
}

/// Gateway redirect-back with the outcome of the current attempt.
#[instrument(
    skip(session, outcome),
    fields(reference = %outcome.reference, status = ?outcome.status)
)]
pub async fn return_from_gateway(
    session: Session,
    Query(outcome): Query<GatewayReturn>,
) -> Result<Json<ApiResponse<CheckoutView>>> {
    let mut checkout = load(&session).await?;
    if checkout.reference() != Some(outcome.reference) {
        return Err(AppError::BadRequest(
            "payment reference does not match the current attempt".to_string(),
        ));
    }

    let mut notifications = Vec::new();
    match outcome.status {
        GatewayOutcome::Success => {
            checkout.confirm_payment()?;
            session
                .remove::<PendingPayment>(session_keys::PENDING_PAYMENT)
                .await?;
            notifications.push(Notification::success("Payment successful"));
        }
        GatewayOutcome::Failure => {
            let message = outcome
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string());
            checkout.fail_payment(message.clone())?;
            tracing::warn!(
                retry_count = checkout.retry_count(),
                "Payment failed: {message}"
            );
            notifications.push(Notification::error(message));
            if !checkout.can_retry() {
                notifications.push(Notification::error(
                    "Payment failed too many times. Go back to checkout to review your order.",
                ));
            }
        }
    }

    store(&session, &checkout).await?;
    Ok(respond(&checkout, notifications))
}

/// Build the gateway URL for a session already in `Processing`.
///
/// If the URL cannot be built the attempt is recorded as failed, so the
/// session never stays stuck in `Processing`.
async fn hand_off(
    state: &AppState,
    session: &Session,
    mut checkout: CheckoutSession,
    reference: PaymentReference,
    pending: &PendingPayment,
) -> Result<Json<ApiResponse<CheckoutView>>> {
    let payload = CheckoutPayload {
        reference,
        amount: pending.amount,
        description: pending.description.clone(),
        return_url: state.config().payment_return_url(),
    };

    match state.gateway().checkout_url(&payload) {
        Ok(url) => {
            store(session, &checkout).await?;
            let mut view = CheckoutView::from(&checkout);
            view.redirect_url = Some(url.into());
            Ok(Json(ApiResponse::new(
                view,
                vec![Notification::info("Redirecting to payment")],
            )))
        }
        Err(err) => {
            checkout.fail_payment("Payment service unavailable")?;
            store(session, &checkout).await?;
            Err(err.into())
        }
    }
}
