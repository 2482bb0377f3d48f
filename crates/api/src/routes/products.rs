//! Product route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde_json::Value;

use ecommerce_core::{FromPayload, NewProduct, ProductId};

use super::{Message, message};
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath};
use crate::models::Product;
use crate::state::AppState;

fn product_not_found() -> AppError {
    AppError::NotFound("Product not found".to_string())
}

/// Create a product.
///
/// POST /products
pub async fn create(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<Value>,
) -> Result<(StatusCode, Json<Product>)> {
    let input = NewProduct::from_payload(&payload)?;
    let product = state.store().create_product(&input).await?;

    tracing::info!(product_id = %product.id, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// List all products.
///
/// GET /products
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.store().list_products().await?))
}

/// Get a product by ID.
///
/// GET /products/{id}
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Product>> {
    state
        .store()
        .get_product(id)
        .await?
        .map(Json)
        .ok_or_else(product_not_found)
}

/// Replace a product's fields.
///
/// PUT /products/{id}
pub async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(payload): ApiJson<Value>,
) -> Result<Json<Product>> {
    let input = NewProduct::from_payload(&payload)?;

    state
        .store()
        .update_product(id, &input)
        .await?
        .map(Json)
        .ok_or_else(product_not_found)
}

/// Delete a product. It disappears from every order it was part of.
///
/// DELETE /products/{id}
pub async fn destroy(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Message>> {
    if !state.store().delete_product(id).await? {
        return Err(product_not_found());
    }

    tracing::info!(product_id = %id, "Product deleted");
    Ok(message("Product deleted"))
}
