//! Cart operation errors.
//!
//! Every operation on [`CartStore`](crate::store::CartStore) either commits or
//! returns a `CartError` with the cart and its snapshot untouched. The UI maps
//! errors to human-readable notices with [`CartError::user_message`].

use thiserror::Error;

use rocketshoes_core::ProductId;

use crate::catalog::LookupError;
use crate::storage::StorageError;

/// The three cart mutations, used to pick a failure message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CartOperation {
    Add,
    Remove,
    UpdateAmount,
}

impl std::fmt::Display for CartOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::UpdateAmount => "update_amount",
        })
    }
}

/// Cart-level error type.
#[derive(Debug, Error)]
pub enum CartError {
    /// Requested quantity is above the available stock.
    #[error("requested {requested} of product {product_id}, only {available} in stock")]
    StockExceeded {
        product_id: ProductId,
        requested: u64,
        available: u64,
    },

    /// Product is not in the cart.
    #[error("product {0} is not in the cart")]
    NotFound(ProductId),

    /// Stock or product lookup failed.
    #[error("catalog lookup failed: {0}")]
    Lookup(#[from] LookupError),

    /// Writing the cart snapshot failed.
    #[error("failed to persist cart: {0}")]
    Storage(#[from] StorageError),
}

impl CartError {
    /// Message shown to the shopper when `operation` fails with this error.
    ///
    /// Only stock shortages get a specific message; every other failure uses
    /// the operation's generic message.
    #[must_use]
    pub const fn user_message(&self, operation: CartOperation) -> &'static str {
        match (self, operation) {
            (Self::StockExceeded { .. }, CartOperation::Add | CartOperation::UpdateAmount) => {
                "Requested quantity is out of stock"
            }
            (_, CartOperation::Add) => "Failed to add product",
            (_, CartOperation::Remove) => "Failed to remove product",
            (_, CartOperation::UpdateAmount) => "Failed to update product amount",
        }
    }

    #[must_use]
    pub const fn is_stock_exceeded(&self) -> bool {
        matches!(self, Self::StockExceeded { .. })
    }
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;
