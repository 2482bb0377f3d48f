//! Validated field sets accepted by the stores.
//!
//! These are the only shapes a store will write. Each one is built from an
//! untyped payload via [`FromPayload`]; identifiers in the payload are ignored
//! because the store assigns them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::types::{Price, UserId};
use crate::validation::{Fields, FromPayload, MAX_TEXT_LENGTH, ValidationErrors};

/// Fields of a user, used for both create and full update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewUser {
    pub name: String,
    pub address: String,
    pub email: String,
}

impl FromPayload for NewUser {
    fn from_payload(payload: &Value) -> Result<Self, ValidationErrors> {
        let mut fields = Fields::new(payload)?;
        let name = fields.required_text("name", MAX_TEXT_LENGTH);
        let address = fields.required_text("address", MAX_TEXT_LENGTH);
        let email = fields.required_text("email", MAX_TEXT_LENGTH);

        match (name, address, email) {
            (Some(name), Some(address), Some(email)) => Ok(Self {
                name,
                address,
                email,
            }),
            _ => Err(fields.into_errors()),
        }
    }
}

/// Fields of a product, used for both create and full update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewProduct {
    pub name: String,
    pub price: Price,
}

impl FromPayload for NewProduct {
    fn from_payload(payload: &Value) -> Result<Self, ValidationErrors> {
        let mut fields = Fields::new(payload)?;
        // `product_name` is accepted for clients written against the column name.
        let name_key = if !fields.contains("name") && fields.contains("product_name") {
            "product_name"
        } else {
            "name"
        };
        let name = fields.required_text(name_key, MAX_TEXT_LENGTH);
        let price = fields.required_price("price");

        match (name, price) {
            (Some(name), Some(price)) => Ok(Self { name, price }),
            _ => Err(fields.into_errors()),
        }
    }
}

/// Fields of a new order.
///
/// `order_date` defaults to the insert time when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewOrder {
    pub user_id: UserId,
    pub order_date: Option<DateTime<Utc>>,
}

impl FromPayload for NewOrder {
    fn from_payload(payload: &Value) -> Result<Self, ValidationErrors> {
        let mut fields = Fields::new(payload)?;
        let user_id = fields.required_id("user_id");
        let order_date = fields.optional_timestamp("order_date");

        match (user_id, order_date) {
            (Some(user_id), Some(order_date)) => Ok(Self {
                user_id,
                order_date,
            }),
            _ => Err(fields.into_errors()),
        }
    }
}

/// Mutable fields of an existing order.
///
/// The owning user is fixed at creation; a `user_id` in the payload is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderChanges {
    pub order_date: DateTime<Utc>,
}

impl FromPayload for OrderChanges {
    fn from_payload(payload: &Value) -> Result<Self, ValidationErrors> {
        let mut fields = Fields::new(payload)?;
        fields
            .required_timestamp("order_date")
            .map(|order_date| Self { order_date })
            .ok_or_else(|| fields.into_errors())
    }
}
