//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PAYSTACK_SECRET_KEY` - Paystack secret key (server-side verification, webhooks)
//! - `PAYSTACK_PUBLIC_KEY` - Paystack public key (handed to the inline widget)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//!
//! ## Optional
//! - `STOREFRONT_DATABASE_URL` / `DATABASE_URL` - `PostgreSQL` connection string
//!   (without one the storefront keeps everything in memory)
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `PAYSTACK_BASE_URL` - Paystack API base (default: <https://api.paystack.co>)
//! - `SANITY_PROJECT_ID` - Sanity project; when unset the catalog is read from `CATALOG_PATH`
//! - `SANITY_DATASET` - Sanity dataset (default: production)
//! - `SANITY_API_VERSION` - Sanity API version (default: 2024-01-01)
//! - `SANITY_TOKEN` - Sanity read token for private datasets
//! - `CATALOG_PATH` - Static catalog JSON (default: crates/storefront/content/products.json)
//! - `EMAIL_API_KEY` - Transactional email API key; email is disabled without it
//! - `EMAIL_API_URL` - Email API base (default: <https://api.resend.com>)
//! - `EMAIL_FROM` - Sender address (default: Adire <orders@adire.ng>)
//! - `STORE_INBOX` - Where contact form messages are forwarded
//! - `ADMIN_EMAILS` - Comma-separated emails allowed to list orders
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;

use adire_core::Email;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

const DEFAULT_PAYSTACK_BASE_URL: &str = "https://api.paystack.co";
const DEFAULT_EMAIL_API_URL: &str = "https://api.resend.com";
const DEFAULT_EMAIL_FROM: &str = "Adire <orders@adire.ng>";
const DEFAULT_CATALOG_PATH: &str = "crates/storefront/content/products.json";

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
    /// `PostgreSQL` connection URL; `None` selects the in-memory store
    pub database_url: Option<SecretString>,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Paystack configuration
    pub paystack: PaystackConfig,
    /// Product catalog source
    pub catalog: CatalogConfig,
    /// Transactional email; `None` disables sending
    pub email: Option<EmailConfig>,
    /// Accounts allowed to read the order listing
    pub admin_emails: Vec<Email>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Paystack API configuration.
///
/// Implements `Debug` manually to redact the secret key.
#[derive(Clone)]
pub struct PaystackConfig {
    /// Secret key for the verify endpoint and webhook signatures
    pub secret_key: SecretString,
    /// Public key for the inline widget (safe to expose in browser)
    pub public_key: String,
    /// API base URL, without trailing slash
    pub base_url: String,
}

impl std::fmt::Debug for PaystackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaystackConfig")
            .field("secret_key", &"[REDACTED]")
            .field("public_key", &self.public_key)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Where the product catalog is read from.
#[derive(Debug, Clone)]
pub enum CatalogConfig {
    /// Sanity content lake.
    Sanity(SanityConfig),
    /// A JSON file of products.
    Static(PathBuf),
}

/// Sanity HTTP query API configuration.
#[derive(Clone)]
pub struct SanityConfig {
    pub project_id: String,
    pub dataset: String,
    pub api_version: String,
    /// Read token for private datasets
    pub token: Option<SecretString>,
}

impl std::fmt::Debug for SanityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SanityConfig")
            .field("project_id", &self.project_id)
            .field("dataset", &self.dataset)
            .field("api_version", &self.api_version)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Transactional email API configuration.
#[derive(Clone)]
pub struct EmailConfig {
    pub api_key: SecretString,
    /// API base URL, without trailing slash
    pub api_url: String,
    /// Sender, e.g. `Adire <orders@adire.ng>`
    pub from: String,
    /// Contact form destination
    pub store_inbox: Option<String>,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("api_key", &"[REDACTED]")
            .field("api_url", &self.api_url)
            .field("from", &self.from)
            .field("store_inbox", &self.store_inbox)
            .finish()
    }
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

        let database_url = get_database_url("STOREFRONT_DATABASE_URL");
        let host = parse_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env("STOREFRONT_PORT", "3000")?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url: trim_trailing_slash(&base_url),
            paystack: PaystackConfig::from_env()?,
            catalog: CatalogConfig::from_env(),
            email: EmailConfig::from_env()?,
            admin_emails: parse_admin_emails(&get_env_or_default("ADMIN_EMAILS", ""))?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// Whether `email` may use the admin order listing.
    #[must_use]
    pub fn is_admin(&self, email: &Email) -> bool {
        self.admin_emails.contains(email)
    }
}

impl PaystackConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            secret_key: get_validated_secret("PAYSTACK_SECRET_KEY")?,
            public_key: get_required_env("PAYSTACK_PUBLIC_KEY")?,
            base_url: trim_trailing_slash(&get_env_or_default(
                "PAYSTACK_BASE_URL",
                DEFAULT_PAYSTACK_BASE_URL,
            )),
        })
    }
}

impl CatalogConfig {
    fn from_env() -> Self {
        get_optional_env("SANITY_PROJECT_ID").map_or_else(
            || {
                Self::Static(PathBuf::from(get_env_or_default(
                    "CATALOG_PATH",
                    DEFAULT_CATALOG_PATH,
                )))
            },
            |project_id| {
                Self::Sanity(SanityConfig {
                    project_id,
                    dataset: get_env_or_default("SANITY_DATASET", "production"),
                    api_version: get_env_or_default("SANITY_API_VERSION", "2024-01-01"),
                    token: get_optional_env("SANITY_TOKEN").map(SecretString::from),
                })
            },
        )
    }
}

impl EmailConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        if get_optional_env("EMAIL_API_KEY").is_none() {
            return Ok(None);
        }

        Ok(Some(Self {
            api_key: get_validated_secret("EMAIL_API_KEY")?,
            api_url: trim_trailing_slash(&get_env_or_default(
                "EMAIL_API_URL",
                DEFAULT_EMAIL_API_URL,
            )),
            from: get_env_or_default("EMAIL_FROM", DEFAULT_EMAIL_FROM),
            store_inbox: get_optional_env("STORE_INBOX"),
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Option<SecretString> {
    get_optional_env(primary_key)
        .or_else(|| get_optional_env("DATABASE_URL"))
        .map(SecretString::from)
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to `default`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn trim_trailing_slash(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Parse the comma-separated admin list.
fn parse_admin_emails(raw: &str) -> Result<Vec<Email>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Email::parse(s)
                .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_EMAILS".to_string(), e.to_string()))
        })
        .collect()
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
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the key issued by the provider."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
