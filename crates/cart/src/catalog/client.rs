//! HTTP client for the catalog API.

use std::sync::Arc;

use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use rocketshoes_core::{ProductDescriptor, ProductId, StockRecord};

use super::types::{ProductResponse, StockResponse};
use super::{LookupError, ProductLookup, StockLookup};
use crate::config::CatalogConfig;

/// Client for the catalog (stock and product) API.
///
/// Cheap to clone; clones share the connection pool and descriptor cache.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    base_url: Url,
    api_token: Option<SecretString>,
    lookup_timeout: std::time::Duration,
    products: Option<Cache<ProductId, ProductDescriptor>>,
}

impl CatalogClient {
    /// Create a new catalog API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &CatalogConfig) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder()
            .timeout(config.lookup_timeout)
            .build()?;

        let products = config.product_cache_ttl.map(|ttl| {
            Cache::builder()
                .max_capacity(1000)
                .time_to_live(ttl)
                .build()
        });

        Ok(Self {
            inner: Arc::new(CatalogClientInner {
                client,
                base_url: config.base_url.clone(),
                api_token: config.api_token.clone(),
                lookup_timeout: config.lookup_timeout,
                products,
            }),
        })
    }

    /// Fetch the current stock for a product. Never cached.
    ///
    /// # Errors
    ///
    /// Returns `LookupError` if the request fails, the product is unknown, or
    /// the response cannot be parsed.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_stock(&self, id: ProductId) -> Result<StockRecord, LookupError> {
        let response: StockResponse = self.get_json(&format!("stock/{id}"), id).await?;
        let record = response.into_record(id)?;
        debug!(amount = record.amount, "Fetched stock");
        Ok(record)
    }

    /// Fetch a product descriptor, served from cache when available.
    ///
    /// # Errors
    ///
    /// Returns `LookupError` if the request fails, the product is unknown, or
    /// the response cannot be parsed.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<ProductDescriptor, LookupError> {
        if let Some(cache) = &self.inner.products
            && let Some(cached) = cache.get(&id).await
        {
            debug!("Cache hit for product");
            return Ok(cached);
        }

        let response: ProductResponse = self.get_json(&format!("products/{id}"), id).await?;
        let descriptor = response.into_descriptor(id)?;

        if let Some(cache) = &self.inner.products {
            cache.insert(id, descriptor.clone()).await;
        }

        Ok(descriptor)
    }

    /// Drop all cached product descriptors.
    pub fn invalidate_products(&self) {
        if let Some(cache) = &self.inner.products {
            cache.invalidate_all();
        }
    }

    /// Execute a GET request and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        id: ProductId,
    ) -> Result<T, LookupError> {
        let url = self
            .inner
            .base_url
            .join(path)
            .map_err(|e| LookupError::Parse(format!("invalid request path {path}: {e}")))?;

        let mut request = self
            .inner
            .client
            .get(url)
            .header("Accept", "application/json");
        if let Some(token) = &self.inner.api_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await.map_err(|e| self.map_transport(e))?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LookupError::NotFound(id));
        }

        // Check for rate limiting
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(LookupError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let body = response.text().await.map_err(|e| self.map_transport(e))?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Catalog API returned non-success status"
            );
            return Err(LookupError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse catalog response"
            );
            LookupError::Parse(e.to_string())
        })
    }

    fn map_transport(&self, error: reqwest::Error) -> LookupError {
        if error.is_timeout() {
            LookupError::Timeout(self.inner.lookup_timeout)
        } else {
            LookupError::Http(error)
        }
    }
}

impl StockLookup for CatalogClient {
    async fn stock(&self, id: ProductId) -> Result<StockRecord, LookupError> {
        self.get_stock(id).await
    }
}

impl ProductLookup for CatalogClient {
    async fn product(&self, id: ProductId) -> Result<ProductDescriptor, LookupError> {
        self.get_product(id).await
    }
}
