//! Randomized cart operation sequences.
//!
//! Drives the store with seeded random adds, removes, updates and stock
//! changes, checking the cart invariants after every step.

#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, HashSet};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use rocketshoes_cart::{
    CART_KEY, CartError, CartStore, CatalogClient, MemoryStore, Outcome, StoreOptions,
};
use rocketshoes_core::{CartState, ProductId};
use rocketshoes_integration_tests::{MockCatalog, MockServer};

const SEEDS: [u64; 4] = [1, 7, 42, 2026];
const STEPS: usize = 150;

type MemoryCart = CartStore<CatalogClient, CatalogClient, MemoryStore>;

async fn open(server: &MockServer, storage: MemoryStore) -> MemoryCart {
    let config = server.catalog_config();
    let client = CatalogClient::new(&config).unwrap();
    CartStore::restore(
        client.clone(),
        client,
        storage,
        StoreOptions::from_config(&config),
    )
    .await
    .unwrap()
}

fn assert_well_formed(cart: &CartState) {
    let mut seen = HashSet::new();
    for item in cart.items() {
        assert!(seen.insert(item.id), "duplicate line for {}", item.id);
        assert!(item.amount >= 1, "line {} has zero amount", item.id);
    }
}

fn assert_snapshot_matches(store: &MemoryCart) {
    if let Some(raw) = store.storage().peek(CART_KEY) {
        let persisted = CartState::from_snapshot(&raw).unwrap();
        assert_eq!(&persisted, store.cart());
    } else {
        assert!(store.cart().is_empty());
    }
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Add(i64),
    Remove(i64),
    Update(i64, i64),
    Restock(i64, i64),
}

fn random_step(rng: &mut StdRng) -> Step {
    let id = rng.random_range(1..=7);
    match rng.random_range(0..10) {
        0..=3 => Step::Add(id),
        4..=5 => Step::Remove(id),
        6..=8 => Step::Update(id, rng.random_range(-2..=8)),
        _ => Step::Restock(id, rng.random_range(-1..=6)),
    }
}

// =============================================================================
// Invariants
// =============================================================================

#[tokio::test]
async fn test_random_sequences_hold_invariants() {
    for seed in SEEDS {
        let mock = MockCatalog::rocketshoes();
        let server = mock.spawn().await;
        let storage = MemoryStore::new();
        let mut store = open(&server, storage.clone()).await;
        let mut rng = StdRng::seed_from_u64(seed);
        let mut stock: HashMap<i64, i64> = [(1, 3), (2, 5), (3, 2), (4, 1), (5, 5), (6, 10)]
            .into_iter()
            .collect();

        for _ in 0..STEPS {
            let step = random_step(&mut rng);
            let before = store.cart().clone();
            let snapshot_before = storage.peek(CART_KEY);

            let result = match step {
                Step::Add(id) => store.add_product(ProductId::new(id)).await,
                Step::Remove(id) => store.remove_product(ProductId::new(id)).await,
                Step::Update(id, amount) => {
                    store
                        .update_product_amount(ProductId::new(id), amount)
                        .await
                }
                Step::Restock(id, amount) => {
                    if stock.contains_key(&id) {
                        mock.set_stock(id, amount);
                        stock.insert(id, amount);
                    }
                    continue;
                }
            };

            assert_well_formed(store.cart());
            assert_snapshot_matches(&store);

            match result {
                Ok(Outcome::Committed) => {
                    if let Step::Add(id) | Step::Update(id, _) = step {
                        let amount = i64::from(store.cart().amount_of(ProductId::new(id)));
                        let available = stock.get(&id).copied().unwrap_or(0).max(0);
                        assert!(amount <= available, "{step:?} exceeded stock {available}");
                    }
                    if let Step::Add(id) = step {
                        let previous = before.amount_of(ProductId::new(id));
                        assert_eq!(store.cart().amount_of(ProductId::new(id)), previous + 1);
                    }
                }
                Ok(Outcome::Ignored) => {
                    assert!(matches!(step, Step::Update(_, amount) if amount <= 0));
                    assert_eq!(store.cart(), &before);
                    assert_eq!(storage.peek(CART_KEY), snapshot_before);
                }
                Err(e) => {
                    if let Step::Add(7) | Step::Update(7, _) = step {
                        assert!(matches!(e, CartError::Lookup(_)), "{step:?}: {e}");
                    }
                    assert_eq!(store.cart(), &before, "{step:?} changed cart on {e}");
                    assert_eq!(storage.peek(CART_KEY), snapshot_before);
                }
            }
        }
    }
}

#[tokio::test]
async fn test_adds_never_duplicate_lines() {
    let mock = MockCatalog::rocketshoes();
    for id in 1..=6 {
        mock.set_stock(id, 1_000);
    }
    let server = mock.spawn().await;
    let mut store = open(&server, MemoryStore::new()).await;
    let mut rng = StdRng::seed_from_u64(99);
    let mut expected: HashMap<i64, u32> = HashMap::new();

    for _ in 0..100 {
        let id = rng.random_range(1..=6);
        store.add_product(ProductId::new(id)).await.unwrap();
        *expected.entry(id).or_default() += 1;
    }

    assert_well_formed(store.cart());
    assert_eq!(store.items().len(), expected.len());
    for (id, amount) in expected {
        assert_eq!(store.cart().amount_of(ProductId::new(id)), amount);
    }
}

// =============================================================================
// Restore
// =============================================================================

#[tokio::test]
async fn test_restore_then_persist_is_identity() {
    let mock = MockCatalog::rocketshoes();
    let server = mock.spawn().await;
    let storage = MemoryStore::new();
    let mut rng = StdRng::seed_from_u64(5);

    {
        let mut store = open(&server, storage.clone()).await;
        for _ in 0..40 {
            let id = ProductId::new(rng.random_range(1..=6));
            if rng.random_bool(0.8) {
                let _ = store.add_product(id).await;
            } else {
                let _ = store.remove_product(id).await;
            }
        }
    }

    let snapshot = storage.peek(CART_KEY).unwrap();
    let restored = open(&server, storage.clone()).await;

    assert_eq!(restored.cart().to_snapshot().unwrap(), snapshot);
    assert_snapshot_matches(&restored);
}
