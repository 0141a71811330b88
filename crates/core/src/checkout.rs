//! Checkout session and payment-retry state machine.
//!
//! ```text
//!              begin_payment              confirm_payment
//!   Idle ───────────────────▶ Processing ─────────────────▶ Success
//!    ▲                          ▲    │
//!    │ back_to_checkout   retry │    │ fail_payment
//!    │                (< 3)     │    ▼
//!    └──────────────────────── Error
//! ```
//!
//! Retries are user-initiated only and capped at [`MAX_PAYMENT_RETRIES`]
//! failures per session. Once the cap is hit the retry action is gone for
//! good; only `back_to_checkout` or a full `restart` remain. The failure
//! counter survives `back_to_checkout` and is cleared only by a confirmed
//! payment or `restart`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{CheckoutStage, PaymentReference, PaymentStatus};

/// Number of failed attempts after which retrying is no longer offered.
pub const MAX_PAYMENT_RETRIES: u8 = 3;

/// Rejected checkout transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    /// Navigation or a new attempt was requested while the gateway is working.
    #[error("a payment is already being processed")]
    PaymentInFlight,

    /// The session already holds a confirmed payment.
    #[error("payment already completed")]
    AlreadyPaid,

    /// There is no stage in the requested direction.
    #[error("no checkout stage beyond {0}")]
    NoAdjacentStage(CheckoutStage),

    /// Payment can only start from the payment stage.
    #[error("payment cannot start from the {0} stage")]
    NotAtPaymentStage(CheckoutStage),

    /// The action does not apply to the current payment status.
    #[error("cannot {action} while payment is {status}")]
    InvalidTransition {
        action: &'static str,
        status: PaymentStatus,
    },

    /// The retry cap has been reached.
    #[error("payment failed 3 times; retry is no longer available")]
    RetryLimitReached,
}

/// Actions the UI should offer for the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableActions {
    /// Stage navigation (next/back) is enabled.
    pub navigate: bool,
    /// A fresh payment attempt can be started.
    pub pay: bool,
    /// The failed attempt can be retried.
    pub retry: bool,
    /// The failed attempt can be abandoned.
    pub back_to_checkout: bool,
}

/// One shopper's trip through checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    stage: CheckoutStage,
    status: PaymentStatus,
    retry_count: u8,
    last_error: Option<String>,
    reference: Option<PaymentReference>,
}

impl CheckoutSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn stage(&self) -> CheckoutStage {
        self.stage
    }

    #[must_use]
    pub const fn status(&self) -> PaymentStatus {
        self.status
    }

    /// True while a handoff to the gateway is in flight.
    #[must_use]
    pub const fn is_processing(&self) -> bool {
        matches!(self.status, PaymentStatus::Processing)
    }

    #[must_use]
    pub const fn retry_count(&self) -> u8 {
        self.retry_count
    }

    /// Gateway error text from the last failure, verbatim.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Reference of the current or most recent attempt.
    #[must_use]
    pub const fn reference(&self) -> Option<PaymentReference> {
        self.reference
    }

    #[must_use]
    pub const fn can_retry(&self) -> bool {
        matches!(self.status, PaymentStatus::Error) && self.retry_count < MAX_PAYMENT_RETRIES
    }

    #[must_use]
    pub const fn retries_remaining(&self) -> u8 {
        MAX_PAYMENT_RETRIES.saturating_sub(self.retry_count)
    }

    #[must_use]
    pub const fn actions(&self) -> AvailableActions {
        let navigable = matches!(self.status, PaymentStatus::Idle | PaymentStatus::Error);
        AvailableActions {
            navigate: navigable,
            pay: matches!(self.status, PaymentStatus::Idle)
                && matches!(self.stage, CheckoutStage::Payment),
            retry: self.can_retry(),
            back_to_checkout: matches!(self.status, PaymentStatus::Error),
        }
    }

    /// Move to the next stage.
    ///
    /// # Errors
    ///
    /// Fails while a payment is in flight or complete, or from the last stage.
    pub fn advance(&mut self) -> Result<CheckoutStage, CheckoutError> {
        self.ensure_navigable()?;
        let next = self
            .stage
            .next()
            .ok_or(CheckoutError::NoAdjacentStage(self.stage))?;
        self.stage = next;
        Ok(next)
    }

    /// Move to the previous stage.
    ///
    /// Leaving the payment stage after a failure also abandons that attempt.
    ///
    /// # Errors
    ///
    /// Fails while a payment is in flight or complete, or from the first stage.
    pub fn back(&mut self) -> Result<CheckoutStage, CheckoutError> {
        self.ensure_navigable()?;
        let previous = self
            .stage
            .previous()
            .ok_or(CheckoutError::NoAdjacentStage(self.stage))?;
        if self.status == PaymentStatus::Error {
            self.abandon_attempt();
        }
        self.stage = previous;
        Ok(previous)
    }

    /// Hand off to the gateway: Idle → Processing.
    ///
    /// # Errors
    ///
    /// Fails outside the payment stage or when the status is not `Idle`.
    pub fn begin_payment(&mut self) -> Result<PaymentReference, CheckoutError> {
        match self.status {
            PaymentStatus::Idle => {}
            PaymentStatus::Processing => return Err(CheckoutError::PaymentInFlight),
            PaymentStatus::Success => return Err(CheckoutError::AlreadyPaid),
            PaymentStatus::Error => {
                return Err(CheckoutError::InvalidTransition {
                    action: "start a new payment",
                    status: self.status,
                });
            }
        }
        if self.stage != CheckoutStage::Payment {
            return Err(CheckoutError::NotAtPaymentStage(self.stage));
        }
        Ok(self.enter_processing())
    }

    /// Gateway confirmed: Processing → Success.
    ///
    /// # Errors
    ///
    /// Fails unless a payment is in flight.
    pub fn confirm_payment(&mut self) -> Result<(), CheckoutError> {
        self.ensure_processing("confirm payment")?;
        self.status = PaymentStatus::Success;
        self.retry_count = 0;
        self.last_error = None;
        Ok(())
    }

    /// Gateway failed: Processing → Error.
    ///
    /// # Errors
    ///
    /// Fails unless a payment is in flight.
    pub fn fail_payment(&mut self, message: impl Into<String>) -> Result<(), CheckoutError> {
        self.ensure_processing("record a payment failure")?;
        self.status = PaymentStatus::Error;
        self.retry_count = self.retry_count.saturating_add(1);
        self.last_error = Some(message.into());
        Ok(())
    }

    /// Try again after a failure: Error → Processing.
    ///
    /// # Errors
    ///
    /// Fails unless the last attempt failed and the retry cap is not reached.
    pub fn retry(&mut self) -> Result<PaymentReference, CheckoutError> {
        if self.status != PaymentStatus::Error {
            return Err(CheckoutError::InvalidTransition {
                action: "retry",
                status: self.status,
            });
        }
        if self.retry_count >= MAX_PAYMENT_RETRIES {
            return Err(CheckoutError::RetryLimitReached);
        }
        Ok(self.enter_processing())
    }

    /// Give up on the failed attempt: Error → Idle.
    ///
    /// Available regardless of how many retries were used.
    ///
    /// # Errors
    ///
    /// Fails unless the last attempt failed.
    pub fn back_to_checkout(&mut self) -> Result<(), CheckoutError> {
        if self.status != PaymentStatus::Error {
            return Err(CheckoutError::InvalidTransition {
                action: "go back to checkout",
                status: self.status,
            });
        }
        self.abandon_attempt();
        Ok(())
    }

    /// Throw the whole session away and start again at the cart.
    pub fn restart(&mut self) {
        *self = Self::default();
    }

    fn enter_processing(&mut self) -> PaymentReference {
        let reference = PaymentReference::generate();
        self.status = PaymentStatus::Processing;
        self.last_error = None;
        self.reference = Some(reference);
        reference
    }

    fn abandon_attempt(&mut self) {
        self.status = PaymentStatus::Idle;
        self.last_error = None;
    }

    const fn ensure_navigable(&self) -> Result<(), CheckoutError> {
        match self.status {
            PaymentStatus::Processing => Err(CheckoutError::PaymentInFlight),
            PaymentStatus::Success => Err(CheckoutError::AlreadyPaid),
            PaymentStatus::Idle | PaymentStatus::Error => Ok(()),
        }
    }

    fn ensure_processing(&self, action: &'static str) -> Result<(), CheckoutError> {
        if self.is_processing() {
            Ok(())
        } else {
            Err(CheckoutError::InvalidTransition {
                action,
                status: self.status,
            })
        }
    }
}
