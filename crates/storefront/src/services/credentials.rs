//! Admin credential verification.
//!
//! The storefront never stores admin passwords. It asks a remote Postgres
//! function (exposed by Supabase's REST gateway) whether a user id and
//! password pair is valid and gets a single boolean back.

use std::future::Future;

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::config::SupabaseConfig;

/// Something that can check an admin user id and password.
pub trait CredentialVerifier {
    /// `Ok(true)` for valid credentials, `Ok(false)` for invalid ones, `Err`
    /// when the check itself could not be carried out.
    fn verify(
        &self,
        user_id: &str,
        password: &str,
    ) -> impl Future<Output = Result<bool, VerifyError>> + Send;
}

impl<T: CredentialVerifier + Sync> CredentialVerifier for &T {
    fn verify(
        &self,
        user_id: &str,
        password: &str,
    ) -> impl Future<Output = Result<bool, VerifyError>> + Send {
        (**self).verify(user_id, password)
    }
}

/// The verification backend could not answer.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// Transport failure or timeout.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("verification backend returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The backend answered with something other than a boolean.
    #[error("unexpected verification response: {0}")]
    UnexpectedResponse(String),

    /// The RPC endpoint URL could not be built.
    #[error("invalid verification endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

/// Calls `POST {SUPABASE_URL}/rest/v1/rpc/{function}` with the anon key.
#[derive(Debug, Clone)]
pub struct SupabaseCredentialVerifier {
    http: reqwest::Client,
    endpoint: Url,
    anon_key: SecretString,
}

impl SupabaseCredentialVerifier {
    /// Build a verifier from configuration.
    ///
    /// # Errors
    ///
    /// Returns `VerifyError` if the endpoint URL is invalid or the HTTP
    /// client cannot be constructed.
    pub fn new(config: &SupabaseConfig) -> Result<Self, VerifyError> {
        let endpoint = config
            .url
            .join(&format!("rest/v1/rpc/{}", config.verify_function))?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            endpoint,
            anon_key: config.anon_key.clone(),
        })
    }

    /// The RPC URL this verifier calls.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl CredentialVerifier for SupabaseCredentialVerifier {
    #[instrument(skip(self, password), fields(endpoint = %self.endpoint))]
    async fn verify(&self, user_id: &str, password: &str) -> Result<bool, VerifyError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .header("apikey", self.anon_key.expose_secret())
            .bearer_auth(self.anon_key.expose_secret())
            .json(&json!({ "user_id": user_id, "password": password }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VerifyError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let value: serde_json::Value = response.json().await?;
        interpret_rpc_result(&value)
    }
}

/// PostgREST returns a scalar function result as bare JSON; a set-returning
/// function yields a one-element array instead.
fn interpret_rpc_result(value: &serde_json::Value) -> Result<bool, VerifyError> {
    match value {
        serde_json::Value::Bool(valid) => Ok(*valid),
        serde_json::Value::Array(items) => match items.as_slice() {
            [serde_json::Value::Bool(valid)] => Ok(*valid),
            _ => Err(VerifyError::UnexpectedResponse(value.to_string())),
        },
        _ => Err(VerifyError::UnexpectedResponse(value.to_string())),
    }
}
