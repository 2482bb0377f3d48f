//! Product domain type.

use serde::{Deserialize, Serialize};

use ecommerce_core::{NewProduct, Price, ProductId};

/// A product that can be attached to any number of orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Store-assigned ID.
    pub id: ProductId,
    pub name: String,
    /// Unit price, never negative.
    pub price: Price,
}

impl Product {
    /// Build the persisted form of `input` under `id`.
    #[must_use]
    pub fn from_input(id: ProductId, input: &NewProduct) -> Self {
        Self {
            id,
            name: input.name.clone(),
            price: input.price,
        }
    }
}
