//! RocketShoes cart library.
//!
//! A persistent, stock-aware shopping cart for a single shopper session.
//!
//! # Modules
//!
//! - [`store`] - `CartStore`: add, remove and update line items
//! - [`catalog`] - Stock and product lookups (`CatalogClient` over HTTP)
//! - [`storage`] - Snapshot persistence (file, `PostgreSQL`, memory)
//! - [`notify`] - Shopper-facing notices for failed operations
//! - [`config`] - Environment configuration
//! - [`error`] - `CartError` and operation messages

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod error;
pub mod notify;
pub mod storage;
pub mod store;

pub use catalog::{CatalogClient, LookupError, ProductLookup, StockLookup};
pub use config::{CartConfig, CatalogConfig, ConfigError, StorageConfig};
pub use error::{CartError, CartOperation};
pub use notify::{Notice, Notifier, RecordingNotifier, TracingNotifier, report};
pub use storage::{
    CART_KEY, FileStore, KeyValueStore, MemoryStore, PostgresStore, Storage, StorageError,
    create_pool,
};
pub use store::{CartStore, Outcome, StoreOptions};
