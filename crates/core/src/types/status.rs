//! Status enums for checkout and payment.

use serde::{Deserialize, Serialize};

/// Step of the purchase flow the shopper is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStage {
    #[default]
    Cart,
    Shipping,
    Payment,
}

impl CheckoutStage {
    /// The stage after this one, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Cart => Some(Self::Shipping),
            Self::Shipping => Some(Self::Payment),
            Self::Payment => None,
        }
    }

    /// The stage before this one, if any.
    #[must_use]
    pub const fn previous(self) -> Option<Self> {
        match self {
            Self::Cart => None,
            Self::Shipping => Some(Self::Cart),
            Self::Payment => Some(Self::Shipping),
        }
    }

    /// One-based position used by progress indicators.
    #[must_use]
    pub const fn step_number(self) -> u8 {
        match self {
            Self::Cart => 1,
            Self::Shipping => 2,
            Self::Payment => 3,
        }
    }
}

impl std::fmt::Display for CheckoutStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cart => write!(f, "cart"),
            Self::Shipping => write!(f, "shipping"),
            Self::Payment => write!(f, "payment"),
        }
    }
}

/// Where the current payment attempt stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// No attempt in flight.
    #[default]
    Idle,
    /// Handed off to the gateway, waiting for the redirect back.
    Processing,
    /// The last attempt failed.
    Error,
    /// The gateway confirmed payment.
    Success,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Processing => write!(f, "processing"),
            Self::Error => write!(f, "error"),
            Self::Success => write!(f, "success"),
        }
    }
}

/// Outcome reported by the gateway when it hands control back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayOutcome {
    Success,
    Failure,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_walk_forward_and_back() {
        assert_eq!(CheckoutStage::Cart.next(), Some(CheckoutStage::Shipping));
        assert_eq!(CheckoutStage::Shipping.next(), Some(CheckoutStage::Payment));
        assert_eq!(CheckoutStage::Payment.next(), None);
        assert_eq!(CheckoutStage::Payment.previous(), Some(CheckoutStage::Shipping));
        assert_eq!(CheckoutStage::Cart.previous(), None);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&PaymentStatus::Processing).unwrap_or_default();
        assert_eq!(json, "\"processing\"");
        let outcome: GatewayOutcome =
            serde_json::from_str("\"failure\"").unwrap_or(GatewayOutcome::Success);
        assert_eq!(outcome, GatewayOutcome::Failure);
    }
}
