//! Stock and product lookups against the catalog service.
//!
//! # Architecture
//!
//! - [`StockLookup`] and [`ProductLookup`] are the seams the cart store
//!   depends on; tests and embedders can supply their own implementations
//! - [`CatalogClient`] implements both over HTTP with `reqwest`
//! - Stock is authoritative and always fetched fresh; product descriptors are
//!   cached via `moka` (5 minute TTL by default)
//!
//! # Endpoints
//!
//! - `GET {base}/stock/{id}` → `{ "id": 1, "amount": 3 }`
//! - `GET {base}/products/{id}` → `{ "id": 1, "title": "...", "price": 179.9, "image": "..." }`
//!
//! # Example
//!
//! ```rust,ignore
//! use rocketshoes_cart::catalog::{CatalogClient, StockLookup};
//!
//! let client = CatalogClient::new(&config.catalog)?;
//! let stock = client.stock(ProductId::new(1)).await?;
//! ```

mod client;
mod types;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rocketshoes_core::{ProductDescriptor, ProductId, StockRecord};
use thiserror::Error;

pub use client::CatalogClient;

/// Errors that can occur when querying the catalog service.
#[derive(Debug, Error)]
pub enum LookupError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Product does not exist in the catalog.
    #[error("Product not found: {0}")]
    NotFound(ProductId),

    /// Rate limited by the catalog service.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Response body could not be interpreted.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The lookup did not complete in time.
    #[error("Lookup timed out after {0:?}")]
    Timeout(Duration),
}

/// Source of authoritative stock levels.
pub trait StockLookup {
    /// Fetch the current stock record for a product.
    fn stock(
        &self,
        id: ProductId,
    ) -> impl Future<Output = Result<StockRecord, LookupError>> + Send;
}

/// Source of product display data.
pub trait ProductLookup {
    /// Fetch the descriptor for a product.
    fn product(
        &self,
        id: ProductId,
    ) -> impl Future<Output = Result<ProductDescriptor, LookupError>> + Send;
}

impl<T: StockLookup + Send + Sync> StockLookup for Arc<T> {
    fn stock(
        &self,
        id: ProductId,
    ) -> impl Future<Output = Result<StockRecord, LookupError>> + Send {
        (**self).stock(id)
    }
}

impl<T: ProductLookup + Send + Sync> ProductLookup for Arc<T> {
    fn product(
        &self,
        id: ProductId,
    ) -> impl Future<Output = Result<ProductDescriptor, LookupError>> + Send {
        (**self).product(id)
    }
}
