//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ROCKETSHOES_API_URL` - Base URL of the catalog API (serves `stock/{id}` and `products/{id}`)
//!
//! ## Optional
//! - `ROCKETSHOES_API_TOKEN` - Bearer token for the catalog API
//! - `ROCKETSHOES_STORAGE` - Snapshot backend: `file`, `postgres` or `memory` (default: file)
//! - `ROCKETSHOES_DATA_DIR` - Directory for the file backend (default: .rocketshoes)
//! - `ROCKETSHOES_DATABASE_URL` - `PostgreSQL` connection string (required for the postgres backend)
//! - `ROCKETSHOES_LOOKUP_TIMEOUT_SECS` - Timeout for each catalog lookup (default: 10)
//! - `ROCKETSHOES_PRODUCT_CACHE_TTL_SECS` - Product descriptor cache TTL, 0 disables (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_LOOKUP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_PRODUCT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_DATA_DIR: &str = ".rocketshoes";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart application configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Catalog API configuration
    pub catalog: CatalogConfig,
    /// Where cart snapshots are persisted
    pub storage: StorageConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Catalog (stock and product) API configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct CatalogConfig {
    /// Base URL, always ending in `/` so relative paths join beneath it
    pub base_url: Url,
    /// Optional bearer token
    pub api_token: Option<SecretString>,
    /// Upper bound for a single stock or product lookup
    pub lookup_timeout: Duration,
    /// Product descriptor cache TTL (`None` disables caching)
    pub product_cache_ttl: Option<Duration>,
}

impl std::fmt::Debug for CatalogConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogConfig")
            .field("base_url", &self.base_url.as_str())
            .field(
                "api_token",
                &self.api_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("lookup_timeout", &self.lookup_timeout)
            .field("product_cache_ttl", &self.product_cache_ttl)
            .finish()
    }
}

impl CatalogConfig {
    /// Build a catalog configuration with default timeout and cache TTL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL cannot be parsed.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url("ROCKETSHOES_API_URL", base_url)?,
            api_token: None,
            lookup_timeout: Duration::from_secs(DEFAULT_LOOKUP_TIMEOUT_SECS),
            product_cache_ttl: Some(Duration::from_secs(DEFAULT_PRODUCT_CACHE_TTL_SECS)),
        })
    }
}

/// Snapshot storage backend selection.
#[derive(Debug, Clone)]
pub enum StorageConfig {
    /// One file per key inside a directory.
    File { dir: PathBuf },
    /// `PostgreSQL` key-value table.
    Postgres { database_url: SecretString },
    /// Process-local map; the cart is lost on exit.
    Memory,
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_vars(&process_env)
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_vars(vars: Vars<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            catalog: CatalogConfig::from_vars(vars)?,
            storage: StorageConfig::from_vars(vars)?,
            sentry_dsn: get_optional_env(vars, "SENTRY_DSN"),
        })
    }
}

impl CatalogConfig {
    fn from_vars(vars: Vars<'_>) -> Result<Self, ConfigError> {
        let base_url = parse_base_url(
            "ROCKETSHOES_API_URL",
            &get_required_env(vars, "ROCKETSHOES_API_URL")?,
        )?;
        let lookup_timeout_secs = get_parsed_env(
            vars,
            "ROCKETSHOES_LOOKUP_TIMEOUT_SECS",
            DEFAULT_LOOKUP_TIMEOUT_SECS,
        )?;
        if lookup_timeout_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "ROCKETSHOES_LOOKUP_TIMEOUT_SECS".to_string(),
                "must be greater than 0".to_string(),
            ));
        }
        let cache_ttl_secs = get_parsed_env(
            vars,
            "ROCKETSHOES_PRODUCT_CACHE_TTL_SECS",
            DEFAULT_PRODUCT_CACHE_TTL_SECS,
        )?;

        Ok(Self {
            base_url,
            api_token: get_optional_env(vars, "ROCKETSHOES_API_TOKEN").map(SecretString::from),
            lookup_timeout: Duration::from_secs(lookup_timeout_secs),
            product_cache_ttl: (cache_ttl_secs > 0).then(|| Duration::from_secs(cache_ttl_secs)),
        })
    }
}

impl StorageConfig {
    /// Load only the storage backend settings.
    ///
    /// Used by commands that never talk to the catalog, such as migrations.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the backend is unknown or its settings are missing.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_vars(&process_env)
    }

    /// Build storage settings from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the backend is unknown or its settings are missing.
    pub fn from_vars(vars: Vars<'_>) -> Result<Self, ConfigError> {
        let backend = get_env_or_default(vars, "ROCKETSHOES_STORAGE", "file");
        match backend.to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File {
                dir: PathBuf::from(get_env_or_default(
                    vars,
                    "ROCKETSHOES_DATA_DIR",
                    DEFAULT_DATA_DIR,
                )),
            }),
            "postgres" => Ok(Self::Postgres {
                database_url: get_database_url(vars, "ROCKETSHOES_DATABASE_URL")?,
            }),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::InvalidEnvVar(
                "ROCKETSHOES_STORAGE".to_string(),
                format!("unknown backend '{other}' (expected file, postgres or memory)"),
            )),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Source of configuration variables, keyed by name.
pub type Vars<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Read a variable from the process environment.
fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get a required environment variable.
fn get_required_env(vars: Vars<'_>, key: &str) -> Result<String, ConfigError> {
    vars(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(vars: Vars<'_>, primary_key: &str) -> Result<SecretString, ConfigError> {
    vars(primary_key)
        .or_else(|| vars("DATABASE_URL"))
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(vars: Vars<'_>, key: &str) -> Option<String> {
    vars(key).filter(|value| !value.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(vars: Vars<'_>, key: &str, default: &str) -> String {
    vars(key).unwrap_or_else(|| default.to_string())
}

/// Get a numeric environment variable with a default value.
fn get_parsed_env(vars: Vars<'_>, key: &str, default: u64) -> Result<u64, ConfigError> {
    vars(key).map_or(Ok(default), |value| {
        value
            .trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Parse a base URL, forcing a trailing slash so `Url::join` keeps the path.
fn parse_base_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let mut url =
        Url::parse(value).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be an absolute http(s) URL".to_string(),
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
