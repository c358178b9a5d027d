//! Key-value persistence for cart snapshots.
//!
//! The cart is stored under a single key, [`CART_KEY`], as a JSON array of
//! line items. The whole value is overwritten on every successful mutation
//! and read once when the store is restored.
//!
//! # Backends
//!
//! - [`FileStore`] - one file per key in a data directory
//! - [`PostgresStore`] - `rocketshoes.kv_store` table
//! - [`MemoryStore`] - process-local map
//!
//! [`Storage`] selects one of them from [`StorageConfig`].

mod file;
mod memory;
mod postgres;

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;

use crate::config::StorageConfig;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use postgres::{PostgresStore, create_pool};

/// Key holding the serialized cart.
pub const CART_KEY: &str = "@RocketShoes:cart";

/// Errors raised by snapshot storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Running migrations failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The cart could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// String key-value persistence.
pub trait KeyValueStore {
    /// Read a value, `None` if the key has never been written.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StorageError>> + Send;

    /// Replace the value stored under `key`.
    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<(), StorageError>> + Send;
}

impl<T: KeyValueStore + Send + Sync> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StorageError>> + Send {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<(), StorageError>> + Send {
        (**self).set(key, value)
    }
}

/// Storage backend chosen at runtime.
#[derive(Debug, Clone)]
pub enum Storage {
    File(FileStore),
    Postgres(PostgresStore),
    Memory(MemoryStore),
}

impl Storage {
    /// Open the configured backend.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Database` if the `PostgreSQL` pool cannot connect.
    pub async fn connect(config: &StorageConfig) -> Result<Self, StorageError> {
        match config {
            StorageConfig::File { dir } => Ok(Self::File(FileStore::new(dir.clone()))),
            StorageConfig::Postgres { database_url } => {
                let pool = create_pool(database_url).await?;
                Ok(Self::Postgres(PostgresStore::new(pool)))
            }
            StorageConfig::Memory => Ok(Self::Memory(MemoryStore::new())),
        }
    }

    /// Short backend name for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Postgres(_) => "postgres",
            Self::Memory(_) => "memory",
        }
    }
}

impl KeyValueStore for Storage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self {
            Self::File(store) => store.get(key).await,
            Self::Postgres(store) => store.get(key).await,
            Self::Memory(store) => store.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        match self {
            Self::File(store) => store.set(key, value).await,
            Self::Postgres(store) => store.set(key, value).await,
            Self::Memory(store) => store.set(key, value).await,
        }
    }
}
