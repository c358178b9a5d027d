//! Cart commands.
//!
//! Each command restores the cart from the configured storage, applies at
//! most one mutation, and prints the resulting cart. Failures are reported
//! through the shopper notice channel and returned so the process exits 1.
//!
//! # Environment Variables
//!
//! See [`rocketshoes_cart::config`].

use thiserror::Error;
use tracing::info;

use rocketshoes_cart::{
    CartConfig, CartError, CartOperation, CartStore, CatalogClient, Outcome, Storage,
    StoreOptions, TracingNotifier, report,
};
use rocketshoes_core::ProductId;

type CliStore = CartStore<CatalogClient, CatalogClient, Storage>;

/// A cart failure that has already been shown to the shopper as a notice.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct NotifiedError(#[from] pub CartError);

/// Restore the cart with collaborators built from configuration.
async fn open(config: &CartConfig) -> Result<CliStore, Box<dyn std::error::Error>> {
    let client = CatalogClient::new(&config.catalog)?;
    let storage = Storage::connect(&config.storage).await?;
    info!(backend = storage.kind(), "Opened cart storage");

    let store = CartStore::restore(
        client.clone(),
        client,
        storage,
        StoreOptions::from_config(&config.catalog),
    )
    .await?;
    Ok(store)
}

/// Print the cart lines and totals.
///
/// # Errors
///
/// Returns an error if the catalog client or storage cannot be opened.
pub async fn show(config: &CartConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = open(config).await?;
    print_cart(&store);
    Ok(())
}

/// Add one unit of a product.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or the add is rejected.
pub async fn add(config: &CartConfig, id: ProductId) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open(config).await?;
    let result = store.add_product(id).await;
    finish(&store, CartOperation::Add, result)
}

/// Remove a product.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or the product is not in the cart.
pub async fn remove(config: &CartConfig, id: ProductId) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open(config).await?;
    let result = store.remove_product(id).await;
    finish(&store, CartOperation::Remove, result)
}

/// Set a product's amount.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or the update is rejected.
pub async fn update(
    config: &CartConfig,
    id: ProductId,
    amount: i64,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open(config).await?;
    let result = store.update_product_amount(id, amount).await;
    finish(&store, CartOperation::UpdateAmount, result)
}

fn finish(
    store: &CliStore,
    operation: CartOperation,
    result: Result<Outcome, CartError>,
) -> Result<(), Box<dyn std::error::Error>> {
    report(operation, &result, &TracingNotifier);

    if result.map_err(NotifiedError)? == Outcome::Ignored {
        info!("Nothing to change");
    }
    print_cart(store);
    Ok(())
}

fn print_cart(store: &CliStore) {
    let summary = store.summary();

    if summary.lines.is_empty() {
        info!("Cart is empty");
        return;
    }

    info!("Cart ({} products)", summary.distinct_products);
    for line in &summary.lines {
        info!(
            "  #{:<5} {:<40} {:>4} x {:>12} = {:>12}",
            line.id.as_i64(),
            line.title,
            line.amount,
            line.unit_price.display(),
            line.subtotal.display()
        );
    }
    info!("Units: {}", summary.units);
    info!("Total: {}", summary.total.display());
}
