//! RocketShoes Core - Shared cart types library.
//!
//! This crate provides the domain types used across all RocketShoes components:
//! - `cart` - Cart store, catalog lookups and snapshot persistence
//! - `cli` - Command-line front end over the cart store
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Product IDs, prices, line items, cart state and catalog records

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
