//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `SUPABASE_URL` - Supabase project URL (e.g., <https://abc.supabase.co>)
//! - `SUPABASE_ANON_KEY` - Supabase anon API key used for the credential RPC
//! - `PAYMENT_GATEWAY_URL` - Hosted checkout page of the payment gateway
//! - `PAYMENT_MERCHANT_ID` - Merchant identifier issued by the gateway
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `SUPABASE_VERIFY_FUNCTION` - RPC that checks admin credentials
//!   (default: `verify_admin_credentials`)
//! - `SUPABASE_TIMEOUT_SECS` - Credential RPC timeout (default: 10)
//! - `PAYMENT_CURRENCY` - ISO currency code sent to the gateway (default: USD)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` / `SENTRY_TRACES_SAMPLE_RATE` - Sentry sampling (default: 1.0 / 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use lustre_core::CurrencyCode;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "xxx",
    "todo",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: Url,
    /// Credential verification backend
    pub supabase: SupabaseConfig,
    /// Hosted payment page
    pub payment: PaymentGatewayConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
}

/// Supabase project settings used for admin credential checks.
///
/// `SecretString` already redacts itself in `Debug` output.
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub url: Url,
    pub anon_key: SecretString,
    /// Name of the Postgres function exposed through `/rest/v1/rpc/`.
    pub verify_function: String,
    pub timeout: Duration,
}

/// Hosted checkout gateway settings.
#[derive(Debug, Clone)]
pub struct PaymentGatewayConfig {
    pub checkout_url: Url,
    pub merchant_id: String,
    pub currency: CurrencyCode,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`StorefrontConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let database_url = env
            .optional("STOREFRONT_DATABASE_URL")
            .or_else(|| env.optional("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("STOREFRONT_DATABASE_URL".to_string()))?;
        let host = env.parsed_or("STOREFRONT_HOST", "127.0.0.1")?;
        let port = env.parsed_or("STOREFRONT_PORT", "3000")?;
        let base_url = env.url("STOREFRONT_BASE_URL")?;

        let supabase = SupabaseConfig {
            url: env.url("SUPABASE_URL")?,
            anon_key: env.validated_secret("SUPABASE_ANON_KEY")?,
            verify_function: env.or_default("SUPABASE_VERIFY_FUNCTION", "verify_admin_credentials"),
            timeout: Duration::from_secs(env.parsed_or("SUPABASE_TIMEOUT_SECS", "10")?),
        };

        let payment = PaymentGatewayConfig {
            checkout_url: env.url("PAYMENT_GATEWAY_URL")?,
            merchant_id: env.required("PAYMENT_MERCHANT_ID")?,
            currency: env.parsed_or("PAYMENT_CURRENCY", "USD")?,
        };

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            supabase,
            payment,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: env.parsed_or("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: env.parsed_or("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.scheme() == "https"
    }

    /// Where the gateway sends the shopper back after an attempt.
    #[must_use]
    pub fn payment_return_url(&self) -> Url {
        let mut url = self.base_url.clone();
        url.set_path("/checkout/return");
        url.set_query(None);
        url
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Environment accessor over a lookup function.
struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn parsed_or<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.or_default(key, default)
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }

    fn url(&self, key: &str) -> Result<Url, ConfigError> {
        let raw = self.required(key)?;
        Url::parse(&raw).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }

    fn validated_secret(&self, key: &str) -> Result<SecretString, ConfigError> {
        let value = self.required(key)?;
        validate_secret_strength(&value, key)?;
        Ok(SecretString::from(value))
    }
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    const ANON_KEY: &str = "eyJhbGciOiJIUzI1NiJ9.aB3xY9mK2nL5pQ7rT0uW4zC6";

    fn base_env() -> HashMap<&'static str, String> {
        HashMap::from([
            ("STOREFRONT_DATABASE_URL", "postgres://localhost/lustre".to_string()),
            ("STOREFRONT_BASE_URL", "https://shop.lustre.example".to_string()),
            ("SUPABASE_URL", "https://abc.supabase.co".to_string()),
            ("SUPABASE_ANON_KEY", ANON_KEY.to_string()),
            ("PAYMENT_GATEWAY_URL", "https://pay.example/checkout".to_string()),
            ("PAYMENT_MERCHANT_ID", "M-1001".to_string()),
        ])
    }

    fn load(env: &HashMap<&'static str, String>) -> Result<StorefrontConfig, ConfigError> {
        StorefrontConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults_applied() {
        let config = load(&base_env()).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.supabase.verify_function, "verify_admin_credentials");
        assert_eq!(config.supabase.timeout, Duration::from_secs(10));
        assert_eq!(config.payment.currency, CurrencyCode::USD);
        assert!(config.is_https());
        assert_eq!(config.sentry_dsn, None);
    }

    #[test]
    fn test_database_url_falls_back_to_generic() {
        let mut env = base_env();
        env.remove("STOREFRONT_DATABASE_URL");
        env.insert("DATABASE_URL", "postgres://fly/lustre".to_string());
        let config = load(&env).unwrap();
        assert_eq!(config.database_url.expose_secret(), "postgres://fly/lustre");
    }

    #[test]
    fn test_missing_required_var() {
        let mut env = base_env();
        env.remove("PAYMENT_MERCHANT_ID");
        assert!(matches!(
            load(&env),
            Err(ConfigError::MissingEnvVar(key)) if key == "PAYMENT_MERCHANT_ID"
        ));
    }

    #[test]
    fn test_invalid_port_and_currency() {
        let mut env = base_env();
        env.insert("STOREFRONT_PORT", "not-a-port".to_string());
        assert!(matches!(load(&env), Err(ConfigError::InvalidEnvVar(..))));

        let mut env = base_env();
        env.insert("PAYMENT_CURRENCY", "DOGE".to_string());
        assert!(matches!(load(&env), Err(ConfigError::InvalidEnvVar(..))));
    }

    #[test]
    fn test_placeholder_anon_key_rejected() {
        let mut env = base_env();
        env.insert("SUPABASE_ANON_KEY", "your-anon-key-here".to_string());
        assert!(matches!(load(&env), Err(ConfigError::InsecureSecret(..))));
    }

    #[test]
    fn test_low_entropy_secret_rejected() {
        assert!(validate_secret_strength(&"a".repeat(40), "KEY").is_err());
        assert!(validate_secret_strength(ANON_KEY, "KEY").is_ok());
    }

    #[test]
    fn test_shannon_entropy() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_payment_return_url() {
        let mut env = base_env();
        env.insert("STOREFRONT_BASE_URL", "http://localhost:3000/?x=1".to_string());
        let config = load(&env).unwrap();
        assert!(!config.is_https());
        assert_eq!(
            config.payment_return_url().as_str(),
            "http://localhost:3000/checkout/return"
        );
    }

    #[test]
    fn test_debug_redacts_anon_key() {
        let config = load(&base_env()).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains(ANON_KEY));
    }
}
