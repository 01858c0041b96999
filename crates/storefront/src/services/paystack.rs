//! Paystack payment provider client.
//!
//! The browser opens the Paystack inline widget with a [`WidgetConfig`] and
//! reports `{reference, channel}` back. That report is never trusted on its
//! own: [`PaystackClient::verify`] asks Paystack for the transaction and
//! [`Transaction::confirm`] checks status, currency and amount.
//!
//! Webhooks are authenticated with [`verify_signature`] (hex HMAC-SHA512 of
//! the raw body, keyed with the secret key).

use std::collections::BTreeMap;
use std::time::Duration;

use hmac::{Hmac, Mac};
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};
use sha2::Sha512;
use thiserror::Error;
use tracing::{debug, instrument};

use adire_core::{CURRENCY_CODE, Email};

use crate::config::PaystackConfig;

/// Prefix for references generated by this store.
pub const REFERENCE_PREFIX: &str = "ADR-";

/// Provider limit on metadata keys.
pub const MAX_METADATA_KEYS: usize = 20;
/// Provider limit on metadata key length.
pub const MAX_METADATA_KEY_LEN: usize = 40;
/// Provider limit on metadata value length.
pub const MAX_METADATA_VALUE_LEN: usize = 500;

/// Errors that can occur when talking to Paystack.
#[derive(Debug, Error)]
pub enum PaystackError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an unexpected error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Paystack does not know the transaction.
    #[error("transaction rejected: {0}")]
    Rejected(String),

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Metadata rejected by the provider limits.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MetadataError {
    #[error("metadata may carry at most {MAX_METADATA_KEYS} keys")]
    TooManyKeys,

    #[error("invalid metadata key: {0:?}")]
    InvalidKey(String),

    #[error("metadata value for {0:?} is longer than {MAX_METADATA_VALUE_LEN} characters")]
    ValueTooLong(String),
}

/// Client for the Paystack transactions API.
#[derive(Clone)]
pub struct PaystackClient {
    client: reqwest::Client,
    base_url: String,
    secret_key: SecretString,
    public_key: String,
}

impl PaystackClient {
    /// Create a new Paystack client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &PaystackConfig) -> Result<Self, PaystackError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            secret_key: config.secret_key.clone(),
            public_key: config.public_key.clone(),
        })
    }

    /// Public key handed to the inline widget.
    #[must_use]
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// Secret key, also used to sign webhooks.
    #[must_use]
    pub const fn secret_key(&self) -> &SecretString {
        &self.secret_key
    }

    /// Fetch a transaction by reference.
    ///
    /// # Errors
    ///
    /// Returns `PaystackError::Rejected` if Paystack has no such transaction.
    /// Returns other variants if the request fails.
    #[instrument(skip(self))]
    pub async fn verify(&self, reference: &str) -> Result<Transaction, PaystackError> {
        let url = format!("{}/transaction/verify/{reference}", self.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(self.secret_key.expose_secret())
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_client_error() {
            let message = serde_json::from_str::<Envelope<serde_json::Value>>(&body)
                .map_or_else(|_| body.chars().take(200).collect(), |e| e.message);
            return Err(PaystackError::Rejected(message));
        }

        if !status.is_success() {
            return Err(PaystackError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let envelope: Envelope<Transaction> = serde_json::from_str(&body)?;
        if !envelope.status {
            return Err(PaystackError::Rejected(envelope.message));
        }

        let transaction = envelope
            .data
            .ok_or_else(|| PaystackError::Rejected("no transaction data".to_string()))?;

        debug!(status = %transaction.status, "Paystack transaction fetched");
        Ok(transaction)
    }

    /// Build the inline widget configuration for a payment.
    #[must_use]
    pub fn widget_config(
        &self,
        email: &Email,
        amount_kobo: i64,
        reference: &str,
        metadata: PaymentMetadata,
    ) -> WidgetConfig {
        WidgetConfig {
            key: self.public_key.clone(),
            email: email.as_str().to_string(),
            amount: amount_kobo,
            currency: CURRENCY_CODE,
            reference: reference.to_string(),
            metadata,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: bool,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

/// A transaction as reported by Paystack.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    pub status: String,
    pub reference: String,
    /// Amount in kobo.
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub channel: Option<String>,
}

impl Transaction {
    /// Check the transaction settles the expected payment.
    ///
    /// # Errors
    ///
    /// Returns a description of the first mismatch.
    pub fn confirm(&self, reference: &str, amount_kobo: i64) -> Result<(), String> {
        if self.reference != reference {
            return Err(format!("reference {} does not match", self.reference));
        }
        if self.status != "success" {
            return Err(format!("transaction status is {}", self.status));
        }
        if self.currency != CURRENCY_CODE {
            return Err(format!("currency {} is not {CURRENCY_CODE}", self.currency));
        }
        if self.amount != amount_kobo {
            return Err(format!(
                "amount {} does not match expected {amount_kobo}",
                self.amount
            ));
        }
        Ok(())
    }
}

/// Configuration for `PaystackPop.setup` in the browser.
#[derive(Debug, Clone, Serialize)]
pub struct WidgetConfig {
    pub key: String,
    pub email: String,
    /// Amount in kobo.
    pub amount: i64,
    pub currency: &'static str,
    #[serde(rename = "ref")]
    pub reference: String,
    pub metadata: PaymentMetadata,
}

/// Flat key/value metadata within the provider limits.
///
/// Serialized as Paystack `custom_fields`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentMetadata {
    fields: BTreeMap<String, String>,
}

impl PaymentMetadata {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a field.
    ///
    /// # Errors
    ///
    /// Returns `MetadataError` if the key or value breaks a provider limit.
    pub fn insert(
        &mut self,
        key: &str,
        value: impl Into<String>,
    ) -> Result<(), MetadataError> {
        let valid_key = (1..=MAX_METADATA_KEY_LEN).contains(&key.len())
            && key
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_');
        if !valid_key {
            return Err(MetadataError::InvalidKey(key.to_string()));
        }

        let value = value.into();
        if value.chars().count() > MAX_METADATA_VALUE_LEN {
            return Err(MetadataError::ValueTooLong(key.to_string()));
        }

        if !self.fields.contains_key(key) && self.fields.len() >= MAX_METADATA_KEYS {
            return Err(MetadataError::TooManyKeys);
        }

        self.fields.insert(key.to_string(), value);
        Ok(())
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Serialize)]
struct CustomField<'a> {
    display_name: String,
    variable_name: &'a str,
    value: &'a str,
}

impl Serialize for PaymentMetadata {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Wire<'a> {
            custom_fields: Vec<CustomField<'a>>,
        }

        let custom_fields = self
            .fields
            .iter()
            .map(|(key, value)| CustomField {
                display_name: key.replace('_', " "),
                variable_name: key,
                value,
            })
            .collect();

        Wire { custom_fields }.serialize(serializer)
    }
}

/// Event name Paystack sends for a settled charge.
pub const CHARGE_SUCCESS: &str = "charge.success";

/// Webhook event payload.
///
/// `data` varies by event type, so it stays untyped until [`Self::charge`].
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl WebhookEvent {
    /// Decode the transaction of a `charge.success` event.
    ///
    /// Returns `None` for any other event type.
    #[must_use]
    pub fn charge(&self) -> Option<Result<Transaction, serde_json::Error>> {
        (self.event == CHARGE_SUCCESS).then(|| Transaction::deserialize(&self.data))
    }
}

/// Generate a fresh payment reference: `ADR-` and 20 uppercase hex characters.
#[must_use]
pub fn generate_reference() -> String {
    let mut bytes = [0u8; 10];
    rand::rng().fill_bytes(&mut bytes);
    format!("{REFERENCE_PREFIX}{}", hex::encode_upper(bytes))
}

/// Verify a webhook signature header against the raw request body.
#[must_use]
pub fn verify_signature(secret: &SecretString, body: &[u8], signature: &str) -> bool {
    let Ok(mut mac) = Hmac::<Sha512>::new_from_slice(secret.expose_secret().as_bytes()) else {
        return false;
    };
    mac.update(body);
    let expected = hex::encode(mac.finalize().into_bytes());

    constant_time_compare(&expected, &signature.trim().to_ascii_lowercase())
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}
