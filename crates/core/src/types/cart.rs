//! Cart line items and the ordered cart state.
//!
//! [`CartState`] upholds two invariants for every value that exists:
//!
//! - every line has `amount >= 1`
//! - no two lines share a [`ProductId`]
//!
//! Both are enforced by the mutation methods and re-checked when a state is
//! rebuilt from a persisted snapshot.

use std::num::NonZeroU32;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use super::catalog::ProductDescriptor;
use super::id::ProductId;
use super::price::{CurrencyCode, Price};

/// Errors raised when a cart cannot be built from persisted data.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// The snapshot is not a JSON array of line items.
    #[error("malformed cart snapshot: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A line item has an amount of zero.
    #[error("line item {0} has amount 0")]
    ZeroAmount(ProductId),

    /// Two line items share the same product.
    #[error("product {0} appears more than once")]
    DuplicateProduct(ProductId),
}

/// One product and its requested quantity within the cart.
///
/// Field names match the catalog API so a snapshot reads like the product
/// payload it was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: ProductId,
    pub title: String,
    #[serde(with = "crate::types::price::json_number")]
    pub price: Decimal,
    pub image: String,
    pub amount: u32,
}

impl LineItem {
    /// Build a line from a catalog descriptor.
    #[must_use]
    pub fn from_descriptor(descriptor: ProductDescriptor, amount: NonZeroU32) -> Self {
        Self {
            id: descriptor.id,
            title: descriptor.title,
            price: descriptor.price,
            image: descriptor.image,
            amount: amount.get(),
        }
    }

    /// Unit price in the smallest currency unit, if it fits in an `i64`.
    #[must_use]
    pub fn price_cents(&self) -> Option<i64> {
        (self.price * Decimal::ONE_HUNDRED).round().to_i64()
    }

    /// `price × amount`.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.price * Decimal::from(self.amount)
    }
}

/// Ordered sequence of line items, unique by product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<LineItem>", into = "Vec<LineItem>")]
pub struct CartState {
    items: Vec<LineItem>,
}

impl CartState {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from line items, validating the invariants.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError::ZeroAmount` or `SnapshotError::DuplicateProduct`
    /// if the items violate the cart invariants.
    pub fn from_items(items: Vec<LineItem>) -> Result<Self, SnapshotError> {
        for (index, item) in items.iter().enumerate() {
            if item.amount == 0 {
                return Err(SnapshotError::ZeroAmount(item.id));
            }
            if items.iter().take(index).any(|other| other.id == item.id) {
                return Err(SnapshotError::DuplicateProduct(item.id));
            }
        }
        Ok(Self { items })
    }

    /// Parse a persisted snapshot.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError::Malformed` if the text is not a JSON array of
    /// line items, or an invariant error if the items are inconsistent.
    pub fn from_snapshot(snapshot: &str) -> Result<Self, SnapshotError> {
        let items: Vec<LineItem> = serde_json::from_str(snapshot)?;
        Self::from_items(items)
    }

    /// Serialize the full cart for persistence.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_snapshot(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.items)
    }

    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.get(id).is_some()
    }

    /// Requested quantity for a product, or 0 when it is not in the cart.
    #[must_use]
    pub fn amount_of(&self, id: ProductId) -> u32 {
        self.get(id).map_or(0, |item| item.amount)
    }

    /// Set the amount of an existing line. Returns `false` if the product is
    /// not in the cart.
    pub fn set_amount(&mut self, id: ProductId, amount: NonZeroU32) -> bool {
        match self.items.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                item.amount = amount.get();
                true
            }
            None => false,
        }
    }

    /// Append a new line at the end of the cart.
    ///
    /// # Errors
    ///
    /// Returns the rejected item if its product is already in the cart or its
    /// amount is zero.
    pub fn push(&mut self, item: LineItem) -> Result<(), Box<LineItem>> {
        if item.amount == 0 || self.contains(item.id) {
            return Err(Box::new(item));
        }
        self.items.push(item);
        Ok(())
    }

    /// Remove a line, returning it if it was present.
    pub fn remove(&mut self, id: ProductId) -> Option<LineItem> {
        let index = self.items.iter().position(|item| item.id == id)?;
        Some(self.items.remove(index))
    }

    /// Derived totals for display.
    #[must_use]
    pub fn summary(&self, currency: CurrencyCode) -> CartSummary {
        let lines: Vec<LineSummary> = self
            .items
            .iter()
            .map(|item| LineSummary {
                id: item.id,
                title: item.title.clone(),
                amount: item.amount,
                unit_price: Price::new(item.price, currency),
                subtotal: Price::new(item.subtotal(), currency),
            })
            .collect();

        let total = self.items.iter().map(LineItem::subtotal).sum();
        let units = self.items.iter().map(|item| u64::from(item.amount)).sum();

        CartSummary {
            lines,
            total: Price::new(total, currency),
            distinct_products: self.items.len(),
            units,
        }
    }
}

impl TryFrom<Vec<LineItem>> for CartState {
    type Error = SnapshotError;

    fn try_from(items: Vec<LineItem>) -> Result<Self, Self::Error> {
        Self::from_items(items)
    }
}

impl From<CartState> for Vec<LineItem> {
    fn from(state: CartState) -> Self {
        state.items
    }
}

/// Per-line display totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineSummary {
    pub id: ProductId,
    pub title: String,
    pub amount: u32,
    pub unit_price: Price,
    pub subtotal: Price,
}

/// Cart totals for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSummary {
    pub lines: Vec<LineSummary>,
    pub total: Price,
    /// Number of distinct products, shown as the cart size badge.
    pub distinct_products: usize,
    /// Sum of all line amounts.
    pub units: u64,
}
