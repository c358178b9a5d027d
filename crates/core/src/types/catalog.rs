//! Read-only records returned by the catalog service.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// Maximum orderable quantity of a product at query time.
///
/// Stock is authoritative and must be fetched fresh for every
/// quantity-affecting operation; never cache it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    pub id: ProductId,
    pub amount: i64,
}

impl StockRecord {
    /// Available quantity, with negative values from the service clamped to zero.
    #[must_use]
    pub fn available(&self) -> u64 {
        u64::try_from(self.amount).unwrap_or(0)
    }
}

/// Display data for a product, fetched when it is first added to a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDescriptor {
    pub id: ProductId,
    pub title: String,
    #[serde(with = "crate::types::price::json_number")]
    pub price: Decimal,
    pub image: String,
}
