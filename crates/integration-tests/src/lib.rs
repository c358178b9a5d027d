//! Integration tests for the RocketShoes cart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p rocketshoes-integration-tests
//!
//! # Include the PostgreSQL storage test
//! ROCKETSHOES_TEST_DATABASE_URL=postgres://... cargo test -p rocketshoes-integration-tests -- --ignored
//! ```
//!
//! # Mock Catalog
//!
//! [`MockCatalog`] serves `GET /stock/{id}` and `GET /products/{id}` from an
//! in-process axum server on an ephemeral port. Tests can change stock,
//! inject failures and count requests while the cart talks to it over HTTP.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::task::JoinHandle;

use rocketshoes_cart::CatalogConfig;

#[derive(Default)]
struct MockState {
    stock: HashMap<i64, i64>,
    products: HashMap<i64, Value>,
    stock_hits: usize,
    product_hits: usize,
    stock_delay: Option<Duration>,
    malformed_stock: bool,
    forced_status: Option<StatusCode>,
    last_authorization: Option<String>,
}

/// Programmable catalog API.
#[derive(Clone, Default)]
pub struct MockCatalog {
    state: Arc<Mutex<MockState>>,
}

impl MockCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The six-shoe catalog the storefront ships with.
    #[must_use]
    pub fn rocketshoes() -> Self {
        Self::new()
            .with_product(1, "Tênis de Caminhada Leve Confortável", 179.9, 3)
            .with_product(2, "Tênis VR Caminhada Confortável Detalhes Couro Masculino", 139.9, 5)
            .with_product(3, "Tênis Adidas Duramo Lite 2.0", 219.9, 2)
            .with_product(4, "Tênis VR Caminhada Confortável Detalhes Couro Masculino", 139.9, 1)
            .with_product(5, "Tênis VR Caminhada Confortável Detalhes Couro Masculino", 139.9, 5)
            .with_product(6, "Tênis Adidas Duramo Lite 2.0", 219.9, 10)
    }

    #[must_use]
    pub fn with_product(self, id: i64, title: &str, price: f64, stock: i64) -> Self {
        {
            let mut state = self.lock();
            state.stock.insert(id, stock);
            state.products.insert(
                id,
                json!({
                    "id": id,
                    "title": title,
                    "price": price,
                    "image": format!("https://rocketseat-cdn.s3-sa-east-1.amazonaws.com/modulo-redux/tenis{id}.jpg"),
                }),
            );
        }
        self
    }

    pub fn set_stock(&self, id: i64, amount: i64) {
        self.lock().stock.insert(id, amount);
    }

    /// Serve a stock entry for a product that has no descriptor.
    pub fn remove_product(&self, id: i64) {
        self.lock().products.remove(&id);
    }

    /// Delay every stock response.
    pub fn delay_stock(&self, delay: Duration) {
        self.lock().stock_delay = Some(delay);
    }

    /// Make stock responses invalid JSON.
    pub fn break_stock(&self) {
        self.lock().malformed_stock = true;
    }

    /// Answer every request with `status`.
    pub fn force_status(&self, status: StatusCode) {
        self.lock().forced_status = Some(status);
    }

    #[must_use]
    pub fn stock_hits(&self) -> usize {
        self.lock().stock_hits
    }

    #[must_use]
    pub fn product_hits(&self) -> usize {
        self.lock().product_hits
    }

    #[must_use]
    pub fn last_authorization(&self) -> Option<String> {
        self.lock().last_authorization.clone()
    }

    /// Start serving on an ephemeral local port.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot bind.
    #[allow(clippy::expect_used)]
    pub async fn spawn(&self) -> MockServer {
        let app = Router::new()
            .route("/stock/{id}", get(stock))
            .route("/products/{id}", get(product))
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock catalog");
        let addr = listener.local_addr().expect("Mock catalog has no address");

        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        MockServer { addr, handle }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record_request(&self, headers: &HeaderMap) -> Option<StatusCode> {
        let mut state = self.lock();
        state.last_authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        state.forced_status
    }
}

/// Running mock server; stops when dropped.
pub struct MockServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl MockServer {
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Catalog config pointing at this server, with a short timeout.
    ///
    /// # Panics
    ///
    /// Panics if the local URL does not parse.
    #[allow(clippy::expect_used)]
    #[must_use]
    pub fn catalog_config(&self) -> CatalogConfig {
        let mut config = CatalogConfig::new(&self.base_url()).expect("Mock URL is valid");
        config.lookup_timeout = Duration::from_secs(2);
        config
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn stock(
    State(mock): State<MockCatalog>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    if let Some(status) = mock.record_request(&headers) {
        return (status, "forced failure").into_response();
    }

    let (amount, delay, malformed) = {
        let mut state = mock.lock();
        state.stock_hits += 1;
        (
            state.stock.get(&id).copied(),
            state.stock_delay,
            state.malformed_stock,
        )
    };

    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    match amount {
        _ if malformed => (StatusCode::OK, "{\"amount\": ").into_response(),
        Some(amount) => Json(json!({ "id": id, "amount": amount })).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({}))).into_response(),
    }
}

async fn product(
    State(mock): State<MockCatalog>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    if let Some(status) = mock.record_request(&headers) {
        return (status, "forced failure").into_response();
    }

    let found = {
        let mut state = mock.lock();
        state.product_hits += 1;
        state.products.get(&id).cloned()
    };

    match found {
        Some(body) => Json(body).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({}))).into_response(),
    }
}
