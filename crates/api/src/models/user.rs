//! User domain type.

use serde::{Deserialize, Serialize};

use ecommerce_core::{NewUser, UserId};

/// A registered customer. Owns zero or more orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Store-assigned ID.
    pub id: UserId,
    pub name: String,
    pub address: String,
    pub email: String,
}

impl User {
    /// Build the persisted form of `input` under `id`.
    #[must_use]
    pub fn from_input(id: UserId, input: &NewUser) -> Self {
        Self {
            id,
            name: input.name.clone(),
            address: input.address.clone(),
            email: input.email.clone(),
        }
    }
}
