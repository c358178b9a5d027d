//! RocketShoes CLI - Manage the shopper's cart from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart and its totals
//! rocketshoes show
//!
//! # Add one unit of product 1
//! rocketshoes add 1
//!
//! # Set product 1 to 3 units (0 or negative amounts are ignored)
//! rocketshoes update 1 3
//!
//! # Remove product 1
//! rocketshoes remove 1
//!
//! # Create the PostgreSQL snapshot table
//! rocketshoes migrate
//! ```
//!
//! # Commands
//!
//! - `show` - Print cart lines and totals
//! - `add` / `remove` / `update` - Cart mutations
//! - `migrate` - Run `PostgreSQL` storage migrations

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rocketshoes_cart::{CartConfig, ConfigError, StorageConfig};
use rocketshoes_core::ProductId;

mod commands;

#[derive(Parser)]
#[command(name = "rocketshoes")]
#[command(author, version, about = "RocketShoes cart tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the cart
    Show,
    /// Add one unit of a product
    Add {
        /// Product ID
        product_id: ProductId,
    },
    /// Remove a product from the cart
    Remove {
        /// Product ID
        product_id: ProductId,
    },
    /// Set the amount of a product already in the cart
    Update {
        /// Product ID
        product_id: ProductId,

        /// New amount (0 or negative is ignored)
        #[arg(allow_negative_numbers = true)]
        amount: i64,
    },
    /// Run storage database migrations
    Migrate,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(dsn: &str) -> sentry::ClientInitGuard {
    sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ))
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Install the tracing subscriber.
///
/// Defaults to info level for our crates if `RUST_LOG` is not set.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "rocketshoes_cart=info,rocketshoes=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = CartConfig::from_env();

    // Sentry must be initialized before the tracing subscriber
    let sentry_dsn = config
        .as_ref()
        .ok()
        .and_then(|c| c.sentry_dsn.clone())
        .or_else(|| std::env::var("SENTRY_DSN").ok().filter(|dsn| !dsn.is_empty()));
    let _sentry_guard = sentry_dsn.as_deref().map(init_sentry);
    init_tracing();

    if let Err(e) = run(cli, config).await {
        if already_notified(e.as_ref()) {
            tracing::debug!("Command failed: {e}");
        } else {
            tracing::error!("Command failed: {e}");
        }
        std::process::exit(1);
    }
}

/// Whether the shopper already saw a notice for this failure.
fn already_notified(error: &(dyn std::error::Error + 'static)) -> bool {
    error.is::<commands::cart::NotifiedError>()
}

fn load(config: Result<CartConfig, ConfigError>) -> Result<CartConfig, Box<dyn std::error::Error>> {
    config.map_err(|e| format!("Failed to load configuration: {e}").into())
}

async fn run(
    cli: Cli,
    config: Result<CartConfig, ConfigError>,
) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Show => commands::cart::show(&load(config)?).await?,
        Commands::Add { product_id } => commands::cart::add(&load(config)?, product_id).await?,
        Commands::Remove { product_id } => {
            commands::cart::remove(&load(config)?, product_id).await?;
        }
        Commands::Update { product_id, amount } => {
            commands::cart::update(&load(config)?, product_id, amount).await?;
        }
        Commands::Migrate => {
            // Migrations only need storage settings, not the catalog
            let storage = match config {
                Ok(config) => config.storage,
                Err(_) => StorageConfig::from_env()
                    .map_err(|e| format!("Failed to load configuration: {e}"))?,
            };
            commands::migrate::run(&storage).await?;
        }
    }
    Ok(())
}
