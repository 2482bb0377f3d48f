//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! # Users
//! POST   /users                                  - Create user
//! GET    /users                                  - List users
//! GET    /users/{id}                             - Get user
//! PUT    /users/{id}                             - Replace user fields
//! DELETE /users/{id}                             - Delete user (refused while it owns orders)
//!
//! # Products
//! POST   /products                               - Create product
//! GET    /products                               - List products
//! GET    /products/{id}                          - Get product
//! PUT    /products/{id}                          - Replace product fields
//! DELETE /products/{id}                          - Delete product and its order links
//!
//! # Orders
//! POST   /orders                                 - Create order for an existing user
//! GET    /orders                                 - List orders
//! GET    /orders/{id}                            - Get order
//! PUT    /orders/{id}                            - Change order date
//! DELETE /orders/{id}                            - Delete order and its product links
//! PUT    /orders/{id}/add_product/{product_id}   - Link product to order
//! DELETE /orders/{id}/remove_product/{product_id} - Unlink product from order
//! GET    /orders/user/{user_id}                  - Orders of a user
//! GET    /orders/{id}/products                   - Products of an order
//!
//! # Admin
//! POST   /reset-database                         - Drop and recreate storage (opt-in)
//! ```

pub mod admin;
pub mod orders;
pub mod products;
pub mod users;

use axum::{
    Json, Router,
    routing::{delete, get, post, put},
};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Body of every response that carries no entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

/// Wrap a message in a JSON response body.
pub(crate) fn message(text: impl Into<String>) -> Json<Message> {
    Json(Message {
        message: text.into(),
    })
}

/// Create the user routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(users::index).post(users::create))
        .route(
            "/{id}",
            get(users::show).put(users::update).delete(users::destroy),
        )
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::destroy),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index).post(orders::create))
        .route(
            "/{id}",
            get(orders::show).put(orders::update).delete(orders::destroy),
        )
        .route("/{id}/products", get(orders::products))
        .route("/{id}/add_product/{product_id}", put(orders::add_product))
        .route(
            "/{id}/remove_product/{product_id}",
            delete(orders::remove_product),
        )
        .route("/user/{user_id}", get(orders::for_user))
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/users", user_routes())
        .nest("/products", product_routes())
        .nest("/orders", order_routes())
        .route("/reset-database", post(admin::reset_database))
}
