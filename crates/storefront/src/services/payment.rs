//! Hosted payment handoff.
//!
//! The storefront never sees card data. Once a checkout session enters
//! `Processing` the shopper is sent to the gateway's hosted checkout page;
//! the gateway later redirects back to `/checkout/return` with the outcome.

use lustre_core::{CurrencyCode, PaymentReference, Price};
use rust_decimal::Decimal;
use thiserror::Error;
use url::Url;

use crate::config::PaymentGatewayConfig;

/// Everything the gateway needs to start one payment attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutPayload {
    pub reference: PaymentReference,
    pub amount: Price,
    pub description: String,
    pub return_url: Url,
}

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("payment amount must be positive")]
    InvalidAmount,

    #[error("gateway accepts {expected}, got {got}")]
    CurrencyMismatch {
        expected: CurrencyCode,
        got: CurrencyCode,
    },

    #[error("invalid gateway URL: {0}")]
    Url(#[from] url::ParseError),
}

impl PaymentError {
    /// True when the request itself was unacceptable.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidAmount | Self::CurrencyMismatch { .. })
    }
}

/// Builds the URL the shopper is redirected to.
pub trait PaymentGateway {
    /// # Errors
    ///
    /// Returns `PaymentError` if the payload cannot be handed off.
    fn checkout_url(&self, payload: &CheckoutPayload) -> Result<Url, PaymentError>;
}

/// Redirect-style gateway configured with a merchant id and a fixed currency.
#[derive(Debug, Clone)]
pub struct HostedCheckoutGateway {
    checkout_url: Url,
    merchant_id: String,
    currency: CurrencyCode,
}

impl HostedCheckoutGateway {
    #[must_use]
    pub fn new(config: &PaymentGatewayConfig) -> Self {
        Self {
            checkout_url: config.checkout_url.clone(),
            merchant_id: config.merchant_id.clone(),
            currency: config.currency,
        }
    }

    #[must_use]
    pub const fn currency(&self) -> CurrencyCode {
        self.currency
    }

    /// Check that this gateway can take `amount`.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::InvalidAmount` for a non-positive amount and
    /// `PaymentError::CurrencyMismatch` for any currency but the configured one.
    pub fn validate(&self, amount: &Price) -> Result<(), PaymentError> {
        if amount.amount <= Decimal::ZERO {
            return Err(PaymentError::InvalidAmount);
        }
        if amount.currency_code != self.currency {
            return Err(PaymentError::CurrencyMismatch {
                expected: self.currency,
                got: amount.currency_code,
            });
        }
        Ok(())
    }
}

impl PaymentGateway for HostedCheckoutGateway {
    fn checkout_url(&self, payload: &CheckoutPayload) -> Result<Url, PaymentError> {
        self.validate(&payload.amount)?;

        let mut url = self.checkout_url.clone();
        url.query_pairs_mut()
            .append_pair("merchant_id", &self.merchant_id)
            .append_pair("reference", &payload.reference.to_string())
            .append_pair("amount", &format!("{:.2}", payload.amount.amount))
            .append_pair("currency", self.currency.code())
            .append_pair("description", &payload.description)
            .append_pair("return_url", payload.return_url.as_str());
        Ok(url)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::str::FromStr;

    use super::*;

    fn gateway() -> HostedCheckoutGateway {
        HostedCheckoutGateway::new(&PaymentGatewayConfig {
            checkout_url: Url::parse("https://pay.example.com/hosted").unwrap(),
            merchant_id: "lustre-01".to_string(),
            currency: CurrencyCode::INR,
        })
    }

    fn payload(amount: &str, currency: CurrencyCode) -> CheckoutPayload {
        CheckoutPayload {
            reference: PaymentReference::generate(),
            amount: Price::new(Decimal::from_str(amount).unwrap(), currency),
            description: "Rose gold ring".to_string(),
            return_url: Url::parse("https://shop.example.com/checkout/return").unwrap(),
        }
    }

    #[test]
    fn test_checkout_url_carries_payment_details() {
        let payload = payload("2499.5", CurrencyCode::INR);
        let url = gateway().checkout_url(&payload).unwrap();
        assert!(url.as_str().starts_with("https://pay.example.com/hosted?"));

        let params: HashMap<String, String> = url.query_pairs().into_owned().collect();
        assert_eq!(params["merchant_id"], "lustre-01");
        assert_eq!(params["reference"], payload.reference.to_string());
        assert_eq!(params["amount"], "2499.50");
        assert_eq!(params["currency"], "INR");
        assert_eq!(params["description"], "Rose gold ring");
        assert_eq!(
            params["return_url"],
            "https://shop.example.com/checkout/return"
        );
    }

    #[test]
    fn test_rejects_non_positive_amount() {
        let err = gateway()
            .checkout_url(&payload("0", CurrencyCode::INR))
            .unwrap_err();
        assert!(matches!(err, PaymentError::InvalidAmount));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_validate_accepts_positive_amount_in_gateway_currency() {
        let gateway = gateway();
        assert!(gateway.validate(&payload("0.01", CurrencyCode::INR).amount).is_ok());

        let negative = payload("-5", CurrencyCode::INR).amount;
        assert!(matches!(
            gateway.validate(&negative),
            Err(PaymentError::InvalidAmount)
        ));
    }

    #[test]
    fn test_rejects_other_currency() {
        let err = gateway()
            .checkout_url(&payload("10", CurrencyCode::USD))
            .unwrap_err();
        assert!(matches!(
            err,
            PaymentError::CurrencyMismatch {
                expected: CurrencyCode::INR,
                got: CurrencyCode::USD
            }
        ));
    }
}
