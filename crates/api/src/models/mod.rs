//! Domain models for the API.
//!
//! These are the persisted entities as handlers and stores see them. Row
//! types used for decoding live next to the queries in [`crate::db`].
//!
//! Relationships are not loaded implicitly: a user's orders and an order's
//! products are fetched through explicit store calls
//! ([`crate::db::OrderStore::list_orders_for_user`],
//! [`crate::db::OrderStore::list_products_for_order`]).

pub mod order;
pub mod product;
pub mod user;

use std::fmt;

pub use order::Order;
pub use product::Product;
pub use user::User;

/// The kinds of entity a lookup can miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    User,
    Product,
    Order,
}

impl Resource {
    /// Human-readable name, as used in response messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Product => "Product",
            Self::Order => "Order",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
