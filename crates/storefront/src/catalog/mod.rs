//! Product catalog provider.
//!
//! # Sources
//!
//! - Sanity content lake via the HTTP query API (GROQ), cached with `moka`
//!   (5 minute TTL)
//! - A static JSON file when no Sanity project is configured
//!
//! Both sources yield the same [`Product`] shape.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use adire_core::Naira;

use crate::config::{CatalogConfig, SanityConfig};

/// GROQ query for every published product.
const PRODUCTS_QUERY: &str = r#"*[_type == "product"] | order(name asc){"id": _id, name, price, description, "images": images[].asset->url}"#;

const CACHE_KEY: &str = "products";

/// Errors from the catalog provider.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The CMS answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The static catalog file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The configured project URL is invalid.
    #[error("Invalid catalog URL: {0}")]
    Url(#[from] url::ParseError),
}

/// A product as returned by the catalog query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: Naira,
    #[serde(default)]
    pub description: Option<String>,
    /// Image URLs, first one is the primary image.
    #[serde(default, deserialize_with = "images_or_null")]
    pub images: Vec<String>,
}

impl Product {
    /// Primary image, used for cart lines.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

// GROQ projections yield `null` for products without images.
fn images_or_null<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let images: Option<Vec<Option<String>>> = Option::deserialize(deserializer)?;
    Ok(images.unwrap_or_default().into_iter().flatten().collect())
}

#[derive(Deserialize)]
struct QueryResponse {
    result: Vec<Product>,
}

/// Read access to the product catalog.
#[derive(Clone)]
pub struct Catalog {
    inner: Arc<CatalogSource>,
}

enum CatalogSource {
    Sanity(SanityClient),
    Static(Vec<Product>),
}

struct SanityClient {
    client: reqwest::Client,
    url: url::Url,
    token: Option<SecretString>,
    cache: Cache<&'static str, Arc<Vec<Product>>>,
}

impl Catalog {
    /// Build the catalog for the configured source.
    ///
    /// # Errors
    ///
    /// Returns an error if the static file cannot be loaded, the Sanity URL
    /// is invalid, or the HTTP client cannot be built.
    pub fn from_config(config: &CatalogConfig) -> Result<Self, CatalogError> {
        match config {
            CatalogConfig::Sanity(sanity) => Self::sanity(sanity),
            CatalogConfig::Static(path) => Self::from_file(path),
        }
    }

    fn sanity(config: &SanityConfig) -> Result<Self, CatalogError> {
        let url = url::Url::parse_with_params(
            &format!(
                "https://{}.api.sanity.io/v{}/data/query/{}",
                config.project_id, config.api_version, config.dataset
            ),
            &[("query", PRODUCTS_QUERY)],
        )?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(10)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Ok(Self {
            inner: Arc::new(CatalogSource::Sanity(SanityClient {
                client,
                url,
                token: config.token.clone(),
                cache,
            })),
        })
    }

    /// Load a static catalog from a JSON array of products.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or malformed.
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        let products: Vec<Product> = serde_json::from_str(&raw)?;
        tracing::info!(count = products.len(), path = %path.display(), "Loaded static catalog");
        Ok(Self::from_products(products))
    }

    /// A fixed in-process catalog.
    #[must_use]
    pub fn from_products(products: Vec<Product>) -> Self {
        Self {
            inner: Arc::new(CatalogSource::Static(products)),
        }
    }

    /// All products.
    ///
    /// # Errors
    ///
    /// Returns an error if the CMS request fails.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Arc<Vec<Product>>, CatalogError> {
        match self.inner.as_ref() {
            CatalogSource::Static(products) => Ok(Arc::new(products.clone())),
            CatalogSource::Sanity(sanity) => sanity.products().await,
        }
    }

    /// A single product by id, `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the CMS request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: &str) -> Result<Option<Product>, CatalogError> {
        if let CatalogSource::Static(products) = self.inner.as_ref() {
            return Ok(products.iter().find(|p| p.id == id).cloned());
        }
        Ok(self.products().await?.iter().find(|p| p.id == id).cloned())
    }
}

impl SanityClient {
    async fn products(&self) -> Result<Arc<Vec<Product>>, CatalogError> {
        if let Some(products) = self.cache.get(CACHE_KEY).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let mut request = self.client.get(self.url.clone());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Sanity API returned non-success status"
            );
            return Err(CatalogError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let parsed: QueryResponse = serde_json::from_str(&body).inspect_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse Sanity query response"
            );
        })?;

        let products = Arc::new(parsed.result);
        self.cache.insert(CACHE_KEY, Arc::clone(&products)).await;
        Ok(products)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> Vec<Product> {
        serde_json::from_str(
            r#"[
                {"id": "adire-kaftan", "name": "Adire Kaftan", "price": 10000,
                 "description": "Hand-dyed", "images": ["https://cdn.example/k.jpg"]},
                {"id": "ankara-tote", "name": "Ankara Tote", "price": "5000.00", "images": null}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_product_parsing_tolerates_null_images() {
        let products = sample();
        assert_eq!(products[0].primary_image(), Some("https://cdn.example/k.jpg"));
        assert!(products[1].images.is_empty());
        assert_eq!(products[1].price, Naira::from_whole(5000));
        assert_eq!(products[1].description, None);
    }

    #[tokio::test]
    async fn test_static_catalog_lookup() {
        let catalog = Catalog::from_products(sample());
        assert_eq!(catalog.products().await.unwrap().len(), 2);
        assert_eq!(
            catalog.product("ankara-tote").await.unwrap().unwrap().name,
            "Ankara Tote"
        );
        assert!(catalog.product("missing").await.unwrap().is_none());
    }

    #[test]
    fn test_sanity_url_encodes_query() {
        let catalog = Catalog::from_config(&CatalogConfig::Sanity(SanityConfig {
            project_id: "abc123".to_string(),
            dataset: "production".to_string(),
            api_version: "2024-01-01".to_string(),
            token: None,
        }))
        .unwrap();

        let CatalogSource::Sanity(client) = catalog.inner.as_ref() else {
            panic!("expected sanity source");
        };
        assert!(
            client
                .url
                .as_str()
                .starts_with("https://abc123.api.sanity.io/v2024-01-01/data/query/production?query=")
        );
        assert_eq!(
            client.url.query_pairs().next().unwrap().1,
            PRODUCTS_QUERY
        );
    }
}
