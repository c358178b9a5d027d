//! Wire types for catalog API responses.

use rust_decimal::Decimal;
use serde::Deserialize;

use rocketshoes_core::{ProductDescriptor, ProductId, StockRecord};

use super::LookupError;

/// Body of `GET stock/{id}`. Some deployments omit the id.
#[derive(Debug, Deserialize)]
pub(super) struct StockResponse {
    #[serde(default)]
    pub id: Option<ProductId>,
    pub amount: i64,
}

/// Body of `GET products/{id}`. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
pub(super) struct ProductResponse {
    pub id: ProductId,
    pub title: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub image: String,
}

impl StockResponse {
    pub(super) fn into_record(self, requested: ProductId) -> Result<StockRecord, LookupError> {
        match self.id {
            Some(id) if id != requested => Err(LookupError::Parse(format!(
                "stock response for product {id}, expected {requested}"
            ))),
            _ => Ok(StockRecord {
                id: requested,
                amount: self.amount,
            }),
        }
    }
}

impl ProductResponse {
    pub(super) fn into_descriptor(
        self,
        requested: ProductId,
    ) -> Result<ProductDescriptor, LookupError> {
        if self.id != requested {
            return Err(LookupError::Parse(format!(
                "product response for product {}, expected {requested}",
                self.id
            )));
        }
        Ok(ProductDescriptor {
            id: self.id,
            title: self.title,
            price: self.price,
            image: self.image,
        })
    }
}
