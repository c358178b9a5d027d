//! End-to-end cart tests.
//!
//! The store talks to the mock catalog over HTTP and persists to a file store
//! in a temporary directory, so each test also covers restart behavior.

#![allow(clippy::unwrap_used)]

use std::path::Path;

use serde_json::Value;
use tempfile::TempDir;

use rocketshoes_cart::{
    CART_KEY, CartError, CartOperation, CartStore, CatalogClient, FileStore, KeyValueStore,
    Outcome, RecordingNotifier, StoreOptions, report,
};
use rocketshoes_core::ProductId;
use rocketshoes_integration_tests::{MockCatalog, MockServer};

type FileCart = CartStore<CatalogClient, CatalogClient, FileStore>;

async fn open(server: &MockServer, dir: &Path) -> FileCart {
    let config = server.catalog_config();
    let client = CatalogClient::new(&config).unwrap();
    CartStore::restore(
        client.clone(),
        client,
        FileStore::new(dir.to_path_buf()),
        StoreOptions::from_config(&config),
    )
    .await
    .unwrap()
}

async fn stored(store: &FileCart) -> Option<Value> {
    let raw = store.storage().get(CART_KEY).await.unwrap()?;
    Some(serde_json::from_str(&raw).unwrap())
}

fn amounts(store: &FileCart) -> Vec<(i64, u32)> {
    store
        .items()
        .iter()
        .map(|item| (item.id.as_i64(), item.amount))
        .collect()
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn test_add_to_empty_cart() {
    let mock = MockCatalog::rocketshoes();
    mock.set_stock(1, 5);
    let server = mock.spawn().await;
    let dir = TempDir::new().unwrap();
    let mut store = open(&server, dir.path()).await;

    let outcome = store.add_product(ProductId::new(1)).await.unwrap();

    assert_eq!(outcome, Outcome::Committed);
    assert_eq!(amounts(&store), vec![(1, 1)]);

    let snapshot = stored(&store).await.unwrap();
    assert_eq!(snapshot[0]["id"], 1);
    assert_eq!(snapshot[0]["amount"], 1);
    assert_eq!(snapshot[0]["title"], "Tênis de Caminhada Leve Confortável");
}

#[tokio::test]
async fn test_add_beyond_stock_is_rejected() {
    let mock = MockCatalog::rocketshoes();
    mock.set_stock(1, 1);
    let server = mock.spawn().await;
    let dir = TempDir::new().unwrap();
    let mut store = open(&server, dir.path()).await;
    store.add_product(ProductId::new(1)).await.unwrap();
    let before = stored(&store).await;
    let notifier = RecordingNotifier::new();

    let result = store.add_product(ProductId::new(1)).await;
    let notified = report(CartOperation::Add, &result, &notifier);

    assert!(matches!(
        result,
        Err(CartError::StockExceeded {
            requested: 2,
            available: 1,
            ..
        })
    ));
    assert!(notified);
    assert_eq!(amounts(&store), vec![(1, 1)]);
    assert_eq!(stored(&store).await, before);

    let notices = notifier.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].message, "Requested quantity is out of stock");
}

#[tokio::test]
async fn test_update_to_zero_is_ignored() {
    let mock = MockCatalog::rocketshoes();
    let server = mock.spawn().await;
    let dir = TempDir::new().unwrap();
    let mut store = open(&server, dir.path()).await;
    for _ in 0..3 {
        store.add_product(ProductId::new(1)).await.unwrap();
    }
    let before = stored(&store).await;
    let stock_hits = mock.stock_hits();
    let notifier = RecordingNotifier::new();

    let result = store.update_product_amount(ProductId::new(1), 0).await;
    let notified = report(CartOperation::UpdateAmount, &result, &notifier);

    assert_eq!(result.unwrap(), Outcome::Ignored);
    assert!(!notified);
    assert!(notifier.notices().is_empty());
    assert_eq!(amounts(&store), vec![(1, 3)]);
    assert_eq!(stored(&store).await, before);
    assert_eq!(mock.stock_hits(), stock_hits);
}

#[tokio::test]
async fn test_remove_last_line_persists_empty_cart() {
    let mock = MockCatalog::rocketshoes();
    let server = mock.spawn().await;
    let dir = TempDir::new().unwrap();
    let mut store = open(&server, dir.path()).await;
    store.add_product(ProductId::new(1)).await.unwrap();
    store.add_product(ProductId::new(1)).await.unwrap();

    store.remove_product(ProductId::new(1)).await.unwrap();

    assert!(store.items().is_empty());
    assert_eq!(stored(&store).await, Some(Value::Array(vec![])));
}

#[tokio::test]
async fn test_remove_missing_product_notifies() {
    let mock = MockCatalog::rocketshoes();
    let server = mock.spawn().await;
    let dir = TempDir::new().unwrap();
    let mut store = open(&server, dir.path()).await;
    let notifier = RecordingNotifier::new();

    let result = store.remove_product(ProductId::new(99)).await;
    report(CartOperation::Remove, &result, &notifier);

    assert!(matches!(result, Err(CartError::NotFound(_))));
    assert!(store.items().is_empty());
    assert_eq!(stored(&store).await, None);

    let notices = notifier.drain();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].message, "Failed to remove product");
    assert_eq!(notices[0].operation, CartOperation::Remove);
}

#[tokio::test]
async fn test_update_within_stock() {
    let mock = MockCatalog::rocketshoes();
    mock.set_stock(1, 10);
    let server = mock.spawn().await;
    let dir = TempDir::new().unwrap();
    let mut store = open(&server, dir.path()).await;
    store.add_product(ProductId::new(1)).await.unwrap();
    store.add_product(ProductId::new(1)).await.unwrap();

    let outcome = store
        .update_product_amount(ProductId::new(1), 5)
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Committed);
    assert_eq!(amounts(&store), vec![(1, 5)]);
    assert_eq!(stored(&store).await.unwrap()[0]["amount"], 5);
}

// =============================================================================
// Catalog Interaction
// =============================================================================

#[tokio::test]
async fn test_descriptor_fetched_once_per_line() {
    let mock = MockCatalog::rocketshoes();
    let server = mock.spawn().await;
    let dir = TempDir::new().unwrap();
    let mut store = open(&server, dir.path()).await;

    store.add_product(ProductId::new(2)).await.unwrap();
    store.add_product(ProductId::new(2)).await.unwrap();
    store.add_product(ProductId::new(2)).await.unwrap();

    assert_eq!(mock.stock_hits(), 3);
    assert_eq!(mock.product_hits(), 1);
    assert_eq!(amounts(&store), vec![(2, 3)]);
}

#[tokio::test]
async fn test_stock_drop_rejects_update() {
    let mock = MockCatalog::rocketshoes();
    let server = mock.spawn().await;
    let dir = TempDir::new().unwrap();
    let mut store = open(&server, dir.path()).await;
    store.add_product(ProductId::new(6)).await.unwrap();
    mock.set_stock(6, 2);
    let notifier = RecordingNotifier::new();

    let result = store.update_product_amount(ProductId::new(6), 3).await;
    report(CartOperation::UpdateAmount, &result, &notifier);

    assert!(result.unwrap_err().is_stock_exceeded());
    assert_eq!(amounts(&store), vec![(6, 1)]);
    assert_eq!(
        notifier.notices()[0].message,
        "Requested quantity is out of stock"
    );
}

#[tokio::test]
async fn test_missing_descriptor_fails_add() {
    let mock = MockCatalog::rocketshoes();
    mock.remove_product(4);
    let server = mock.spawn().await;
    let dir = TempDir::new().unwrap();
    let mut store = open(&server, dir.path()).await;
    let notifier = RecordingNotifier::new();

    let result = store.add_product(ProductId::new(4)).await;
    report(CartOperation::Add, &result, &notifier);

    assert!(matches!(result, Err(CartError::Lookup(_))));
    assert!(store.items().is_empty());
    assert_eq!(stored(&store).await, None);
    assert_eq!(notifier.notices()[0].message, "Failed to add product");
}

#[tokio::test]
async fn test_catalog_outage_leaves_cart_unchanged() {
    let mock = MockCatalog::rocketshoes();
    let server = mock.spawn().await;
    let dir = TempDir::new().unwrap();
    let mut store = open(&server, dir.path()).await;
    store.add_product(ProductId::new(1)).await.unwrap();
    let before = stored(&store).await;
    mock.force_status(axum::http::StatusCode::SERVICE_UNAVAILABLE);
    let notifier = RecordingNotifier::new();

    let add = store.add_product(ProductId::new(1)).await;
    report(CartOperation::Add, &add, &notifier);
    let update = store.update_product_amount(ProductId::new(1), 2).await;
    report(CartOperation::UpdateAmount, &update, &notifier);

    assert!(add.is_err());
    assert!(update.is_err());
    assert_eq!(amounts(&store), vec![(1, 1)]);
    assert_eq!(stored(&store).await, before);

    let messages: Vec<_> = notifier.notices().iter().map(|n| n.message).collect();
    assert_eq!(
        messages,
        vec!["Failed to add product", "Failed to update product amount"]
    );
}

#[tokio::test]
async fn test_update_missing_line_checks_stock_first() {
    let mock = MockCatalog::rocketshoes();
    let server = mock.spawn().await;
    let dir = TempDir::new().unwrap();
    let mut store = open(&server, dir.path()).await;

    let result = store.update_product_amount(ProductId::new(3), 1).await;

    assert!(matches!(result, Err(CartError::NotFound(_))));
    assert_eq!(mock.stock_hits(), 1);
    assert_eq!(mock.product_hits(), 0);
}

// =============================================================================
// Restart
// =============================================================================

#[tokio::test]
async fn test_cart_survives_restart() {
    let mock = MockCatalog::rocketshoes();
    let server = mock.spawn().await;
    let dir = TempDir::new().unwrap();

    {
        let mut store = open(&server, dir.path()).await;
        store.add_product(ProductId::new(3)).await.unwrap();
        store.add_product(ProductId::new(1)).await.unwrap();
        store.update_product_amount(ProductId::new(1), 3).await.unwrap();
    }

    let store = open(&server, dir.path()).await;
    assert_eq!(amounts(&store), vec![(3, 1), (1, 3)]);

    let summary = store.summary();
    assert_eq!(summary.units, 4);
    assert_eq!(summary.total.display(), "R$\u{a0}759,60");
}

#[tokio::test]
async fn test_restored_cart_keeps_stored_descriptor() {
    let mock = MockCatalog::rocketshoes();
    let server = mock.spawn().await;
    let dir = TempDir::new().unwrap();

    {
        let mut store = open(&server, dir.path()).await;
        store.add_product(ProductId::new(5)).await.unwrap();
    }

    let mut store = open(&server, dir.path()).await;
    store.add_product(ProductId::new(5)).await.unwrap();

    assert_eq!(mock.product_hits(), 1);
    assert_eq!(amounts(&store), vec![(5, 2)]);
}

#[tokio::test]
async fn test_corrupt_snapshot_starts_empty() {
    let mock = MockCatalog::rocketshoes();
    let server = mock.spawn().await;
    let dir = TempDir::new().unwrap();
    let files = FileStore::new(dir.path().to_path_buf());
    files.set(CART_KEY, "{not json").await.unwrap();

    let mut store = open(&server, dir.path()).await;
    assert!(store.items().is_empty());
    assert_eq!(
        files.get(CART_KEY).await.unwrap().as_deref(),
        Some("{not json")
    );

    store.add_product(ProductId::new(1)).await.unwrap();
    assert_eq!(amounts(&store), vec![(1, 1)]);
    assert_eq!(stored(&store).await.unwrap().as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_duplicate_snapshot_starts_empty() {
    let mock = MockCatalog::rocketshoes();
    let server = mock.spawn().await;
    let dir = TempDir::new().unwrap();
    let line = r#"{"id":1,"title":"Tênis","price":179.9,"image":"x.jpg","amount":1}"#;
    FileStore::new(dir.path().to_path_buf())
        .set(CART_KEY, &format!("[{line},{line}]"))
        .await
        .unwrap();

    let store = open(&server, dir.path()).await;

    assert!(store.items().is_empty());
}
