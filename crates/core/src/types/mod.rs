//! Core types for RocketShoes.
//!
//! This module provides type-safe wrappers for the cart domain.

pub mod cart;
pub mod catalog;
pub mod id;
pub mod price;

pub use cart::{CartState, CartSummary, LineItem, LineSummary, SnapshotError};
pub use catalog::{ProductDescriptor, StockRecord};
pub use id::*;
pub use price::{CurrencyCode, Price};
