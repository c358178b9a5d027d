//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! ROCKETSHOES_STORAGE=postgres rocketshoes migrate
//! ```
//!
//! # Environment Variables
//!
//! - `ROCKETSHOES_STORAGE` - must be `postgres`
//! - `ROCKETSHOES_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! Catalog settings such as `ROCKETSHOES_API_URL` are not read.
//!
//! # Migration Files
//!
//! Stored in `crates/cart/migrations/`.

use thiserror::Error;

use rocketshoes_cart::storage::{PostgresStore, StorageError, create_pool};
use rocketshoes_cart::StorageConfig;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Migrations only apply to the `PostgreSQL` backend.
    #[error("ROCKETSHOES_STORAGE is '{0}', migrations require 'postgres'")]
    WrongBackend(&'static str),

    /// Connecting or migrating failed.
    #[error("{0}")]
    Storage(#[from] StorageError),
}

/// Run the key-value storage migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the backend is not `PostgreSQL` or a migration fails.
pub async fn run(storage: &StorageConfig) -> Result<(), MigrationError> {
    let database_url = match storage {
        StorageConfig::Postgres { database_url } => database_url,
        StorageConfig::File { .. } => return Err(MigrationError::WrongBackend("file")),
        StorageConfig::Memory => return Err(MigrationError::WrongBackend("memory")),
    };

    tracing::info!("Connecting to storage database...");
    let pool = create_pool(database_url).await.map_err(StorageError::from)?;

    tracing::info!("Running storage migrations...");
    PostgresStore::new(pool).migrate().await?;

    tracing::info!("Storage migrations complete!");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[tokio::test]
    async fn test_rejects_non_postgres_backends() {
        let err = run(&StorageConfig::Memory).await.unwrap_err();
        assert!(matches!(err, MigrationError::WrongBackend("memory")));

        let file = StorageConfig::File {
            dir: PathBuf::from(".rocketshoes"),
        };
        let err = run(&file).await.unwrap_err();
        assert!(matches!(err, MigrationError::WrongBackend("file")));
    }
}
