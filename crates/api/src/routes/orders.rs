//! Order route handlers, including the order/product association.

use axum::{Json, extract::State, http::StatusCode};
use serde_json::Value;

use ecommerce_core::{FromPayload, NewOrder, OrderChanges, OrderId, ProductId, UserId};

use super::{Message, message};
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath};
use crate::models::{Order, Product};
use crate::state::AppState;

fn order_not_found() -> AppError {
    AppError::NotFound("Order not found".to_string())
}

/// Create an order for an existing user.
///
/// POST /orders
///
/// `order_date` defaults to now. An unknown `user_id` is a 404 and nothing
/// is written.
pub async fn create(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<Value>,
) -> Result<(StatusCode, Json<Order>)> {
    let input = NewOrder::from_payload(&payload)?;
    let order = state.store().create_order(&input).await?;

    tracing::info!(order_id = %order.id, user_id = %order.user_id, "Order created");
    Ok((StatusCode::CREATED, Json(order)))
}

/// List all orders.
///
/// GET /orders
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Order>>> {
    Ok(Json(state.store().list_orders().await?))
}

/// Get an order by ID.
///
/// GET /orders/{id}
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<Order>> {
    state
        .store()
        .get_order(id)
        .await?
        .map(Json)
        .ok_or_else(order_not_found)
}

/// Change an order's date. The owning user cannot be changed.
///
/// PUT /orders/{id}
pub async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<OrderId>,
    ApiJson(payload): ApiJson<Value>,
) -> Result<Json<Order>> {
    let changes = OrderChanges::from_payload(&payload)?;

    state
        .store()
        .update_order(id, &changes)
        .await?
        .map(Json)
        .ok_or_else(order_not_found)
}

/// Delete an order. Its products are unlinked, not deleted.
///
/// DELETE /orders/{id}
pub async fn destroy(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<Message>> {
    if !state.store().delete_order(id).await? {
        return Err(order_not_found());
    }

    tracing::info!(order_id = %id, "Order deleted");
    Ok(message("Order deleted"))
}

/// Link a product to an order.
///
/// PUT /orders/{id}/add_product/{product_id}
pub async fn add_product(
    State(state): State<AppState>,
    ApiPath((order_id, product_id)): ApiPath<(OrderId, ProductId)>,
) -> Result<Json<Message>> {
    state
        .store()
        .add_product_to_order(order_id, product_id)
        .await?;

    tracing::info!(order_id = %order_id, product_id = %product_id, "Product added to order");
    Ok(message("Product added to order"))
}

/// Unlink a product from an order.
///
/// DELETE /orders/{id}/remove_product/{product_id}
pub async fn remove_product(
    State(state): State<AppState>,
    ApiPath((order_id, product_id)): ApiPath<(OrderId, ProductId)>,
) -> Result<Json<Message>> {
    state
        .store()
        .remove_product_from_order(order_id, product_id)
        .await?;

    tracing::info!(order_id = %order_id, product_id = %product_id, "Product removed from order");
    Ok(message("Product removed from order"))
}

/// Orders owned by a user.
///
/// GET /orders/user/{user_id}
pub async fn for_user(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<UserId>,
) -> Result<Json<Vec<Order>>> {
    state
        .store()
        .list_orders_for_user(user_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// Products linked to an order.
///
/// GET /orders/{id}/products
pub async fn products(
    State(state): State<AppState>,
    ApiPath(order_id): ApiPath<OrderId>,
) -> Result<Json<Vec<Product>>> {
    state
        .store()
        .list_products_for_order(order_id)
        .await?
        .map(Json)
        .ok_or_else(order_not_found)
}
