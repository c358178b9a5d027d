//! The cart store: in-memory cart state plus its persisted snapshot.
//!
//! # Commit protocol
//!
//! Each mutation builds the next [`CartState`] on a copy, writes its snapshot
//! under [`CART_KEY`], and only then replaces the in-memory cart. A rejected
//! check, failed lookup or failed write leaves both the cart and the stored
//! snapshot exactly as they were.
//!
//! Mutations take `&mut self`, so one store never runs two of them at once.
//!
//! # Example
//!
//! ```rust,ignore
//! let client = CatalogClient::new(&config.catalog)?;
//! let storage = Storage::connect(&config.storage).await?;
//! let mut store = CartStore::restore(client.clone(), client, storage, StoreOptions::default()).await?;
//!
//! let result = store.add_product(ProductId::new(1)).await;
//! notify::report(CartOperation::Add, &result, &TracingNotifier);
//! ```

use std::future::Future;
use std::num::NonZeroU32;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use rocketshoes_core::{CartState, CartSummary, CurrencyCode, LineItem, ProductId};

use crate::catalog::{LookupError, ProductLookup, StockLookup};
use crate::config::CatalogConfig;
use crate::error::{CartError, Result};
use crate::storage::{CART_KEY, KeyValueStore, StorageError};

/// Tunables for a [`CartStore`].
#[derive(Debug, Clone, Copy)]
pub struct StoreOptions {
    /// Upper bound for each stock or product lookup.
    pub lookup_timeout: Duration,
    /// Currency used by [`CartStore::summary`].
    pub currency: CurrencyCode,
}

impl StoreOptions {
    /// Options matching the catalog client's timeout.
    #[must_use]
    pub fn from_config(config: &CatalogConfig) -> Self {
        Self {
            lookup_timeout: config.lookup_timeout,
            ..Self::default()
        }
    }
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            lookup_timeout: Duration::from_secs(10),
            currency: CurrencyCode::default(),
        }
    }
}

/// Result of a successful operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The cart changed and the snapshot was written.
    Committed,
    /// The request was a no-op by policy (non-positive amount).
    Ignored,
}

/// Shopping cart for one session.
pub struct CartStore<S, P, K> {
    stock: S,
    products: P,
    storage: K,
    cart: CartState,
    options: StoreOptions,
}

impl<S, P, K> CartStore<S, P, K>
where
    S: StockLookup,
    P: ProductLookup,
    K: KeyValueStore,
{
    /// Build the store from the persisted snapshot.
    ///
    /// A missing snapshot yields an empty cart. A snapshot that is not valid
    /// JSON, or that holds duplicate products or zero amounts, is discarded
    /// with a warning and the cart starts empty; it is overwritten by the
    /// next successful mutation.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    #[instrument(skip_all)]
    pub async fn restore(
        stock: S,
        products: P,
        storage: K,
        options: StoreOptions,
    ) -> std::result::Result<Self, StorageError> {
        let cart = match storage.get(CART_KEY).await? {
            None => {
                debug!("No stored cart, starting empty");
                CartState::new()
            }
            Some(snapshot) => match CartState::from_snapshot(&snapshot) {
                Ok(cart) => {
                    info!(lines = cart.len(), "Restored cart");
                    cart
                }
                Err(e) => {
                    warn!(error = %e, "Discarding unreadable cart snapshot, starting empty");
                    CartState::new()
                }
            },
        };

        Ok(Self {
            stock,
            products,
            storage,
            cart,
            options,
        })
    }

    /// Current cart.
    #[must_use]
    pub const fn cart(&self) -> &CartState {
        &self.cart
    }

    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        self.cart.items()
    }

    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&LineItem> {
        self.cart.get(id)
    }

    /// Display totals in the configured currency.
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        self.cart.summary(self.options.currency)
    }

    #[must_use]
    pub const fn storage(&self) -> &K {
        &self.storage
    }

    #[must_use]
    pub const fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Add one unit of a product.
    ///
    /// Fetches the product descriptor only when the product is not yet in the
    /// cart; otherwise increments the existing line by exactly one.
    ///
    /// # Errors
    ///
    /// - `CartError::StockExceeded` if one more unit would exceed stock
    /// - `CartError::Lookup` if the stock or product lookup fails
    /// - `CartError::Storage` if the snapshot cannot be written
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn add_product(&mut self, id: ProductId) -> Result<Outcome> {
        let current = self.cart.amount_of(id);
        let stock = self.lookup(self.stock.stock(id)).await?;
        let desired = u64::from(current) + 1;

        if desired > stock.available() {
            debug!(desired, available = stock.available(), "Add rejected by stock");
            return Err(CartError::StockExceeded {
                product_id: id,
                requested: desired,
                available: stock.available(),
            });
        }

        let mut next = self.cart.clone();
        match to_amount(desired) {
            Some(amount) if current > 0 => {
                next.set_amount(id, amount);
            }
            Some(amount) => {
                let descriptor = self.lookup(self.products.product(id)).await?;
                if descriptor.id != id {
                    return Err(LookupError::Parse(format!(
                        "descriptor for product {} returned for {id}",
                        descriptor.id
                    ))
                    .into());
                }
                next.push(LineItem::from_descriptor(descriptor, amount))
                    .map_err(|line| {
                        LookupError::Parse(format!("product {} is already in the cart", line.id))
                    })?;
            }
            None => {
                return Err(CartError::StockExceeded {
                    product_id: id,
                    requested: desired,
                    available: stock.available(),
                });
            }
        }

        self.commit(next).await
    }

    /// Remove a product's line from the cart.
    ///
    /// # Errors
    ///
    /// - `CartError::NotFound` if the product is not in the cart
    /// - `CartError::Storage` if the snapshot cannot be written
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn remove_product(&mut self, id: ProductId) -> Result<Outcome> {
        let mut next = self.cart.clone();
        if next.remove(id).is_none() {
            debug!("Remove rejected, product not in cart");
            return Err(CartError::NotFound(id));
        }

        self.commit(next).await
    }

    /// Set a product's amount.
    ///
    /// A non-positive `amount` is ignored: nothing is fetched, changed or
    /// written, and `Outcome::Ignored` is returned.
    ///
    /// # Errors
    ///
    /// - `CartError::StockExceeded` if `amount` exceeds stock
    /// - `CartError::NotFound` if the product is not in the cart
    /// - `CartError::Lookup` if the stock lookup fails
    /// - `CartError::Storage` if the snapshot cannot be written
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn update_product_amount(&mut self, id: ProductId, amount: i64) -> Result<Outcome> {
        let Ok(requested) = u64::try_from(amount) else {
            debug!("Ignoring negative amount");
            return Ok(Outcome::Ignored);
        };
        if requested == 0 {
            debug!("Ignoring zero amount");
            return Ok(Outcome::Ignored);
        }

        let stock = self.lookup(self.stock.stock(id)).await?;
        let exceeded = CartError::StockExceeded {
            product_id: id,
            requested,
            available: stock.available(),
        };
        if requested > stock.available() {
            debug!(requested, available = stock.available(), "Update rejected by stock");
            return Err(exceeded);
        }
        let Some(new_amount) = to_amount(requested) else {
            return Err(exceeded);
        };

        let mut next = self.cart.clone();
        if !next.set_amount(id, new_amount) {
            debug!("Update rejected, product not in cart");
            return Err(CartError::NotFound(id));
        }

        self.commit(next).await
    }

    /// Run a lookup under the configured timeout.
    async fn lookup<T>(
        &self,
        request: impl Future<Output = std::result::Result<T, LookupError>>,
    ) -> std::result::Result<T, LookupError> {
        let limit = self.options.lookup_timeout;
        tokio::time::timeout(limit, request)
            .await
            .map_err(|_| LookupError::Timeout(limit))?
    }

    /// Persist `next`, then make it the current cart.
    async fn commit(&mut self, next: CartState) -> Result<Outcome> {
        let snapshot = next.to_snapshot().map_err(StorageError::from)?;
        self.storage.set(CART_KEY, &snapshot).await?;
        self.cart = next;

        info!(
            lines = self.cart.len(),
            units = self.cart.items().iter().map(|i| u64::from(i.amount)).sum::<u64>(),
            "Cart committed"
        );
        Ok(Outcome::Committed)
    }
}

fn to_amount(amount: u64) -> Option<NonZeroU32> {
    u32::try_from(amount).ok().and_then(NonZeroU32::new)
}
