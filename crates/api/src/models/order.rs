//! Order domain type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ecommerce_core::{OrderId, UserId};

/// An order placed by a user.
///
/// The ID and owning user never change after creation. Products are attached
/// and detached through the association operations of the order store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Store-assigned ID.
    pub id: OrderId,
    /// When the order was placed (UTC).
    pub order_date: DateTime<Utc>,
    /// Owning user.
    pub user_id: UserId,
}
