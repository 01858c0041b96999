//! Application state shared across handlers.

use std::sync::Arc;

use crate::catalog::{Catalog, CatalogError};
use crate::config::StorefrontConfig;
use crate::db::Database;
use crate::services::email::{EmailClient, EmailDeliveryError};
use crate::services::paystack::{PaystackClient, PaystackError};

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("catalog: {0}")]
    Catalog(#[from] CatalogError),
    #[error("paystack client: {0}")]
    Paystack(#[from] PaystackError),
    #[error("email client: {0}")]
    Email(#[from] EmailDeliveryError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the store, catalog and provider clients.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    database: Database,
    catalog: Catalog,
    paystack: PaystackClient,
    email: Option<EmailClient>,
}

impl AppState {
    /// Create a new application state, building the catalog from config.
    ///
    /// # Errors
    ///
    /// Returns an error if a provider client cannot be built or the static
    /// catalog cannot be loaded.
    pub fn new(config: StorefrontConfig, database: Database) -> Result<Self, StateError> {
        let catalog = Catalog::from_config(&config.catalog)?;
        Self::with_catalog(config, database, catalog)
    }

    /// Create a new application state with an explicit catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if a provider client cannot be built.
    pub fn with_catalog(
        config: StorefrontConfig,
        database: Database,
        catalog: Catalog,
    ) -> Result<Self, StateError> {
        let paystack = PaystackClient::new(&config.paystack)?;
        let email = config
            .email
            .as_ref()
            .map(|email| EmailClient::new(email, &config.base_url))
            .transpose()?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                database,
                catalog,
                paystack,
                email,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the document store.
    #[must_use]
    pub fn db(&self) -> &Database {
        &self.inner.database
    }

    /// Get a reference to the product catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// Get a reference to the Paystack client.
    #[must_use]
    pub fn paystack(&self) -> &PaystackClient {
        &self.inner.paystack
    }

    /// Get the email client, if email delivery is configured.
    #[must_use]
    pub fn email(&self) -> Option<&EmailClient> {
        self.inner.email.as_ref()
    }
}
