//! User route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde_json::Value;

use ecommerce_core::{FromPayload, NewUser, UserId};

use super::{Message, message};
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath};
use crate::models::User;
use crate::state::AppState;

/// Create a user.
///
/// POST /users
pub async fn create(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<Value>,
) -> Result<(StatusCode, Json<User>)> {
    let input = NewUser::from_payload(&payload)?;
    let user = state.store().create_user(&input).await?;

    tracing::info!(user_id = %user.id, "User created");
    Ok((StatusCode::CREATED, Json(user)))
}

/// List all users.
///
/// GET /users
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<User>>> {
    Ok(Json(state.store().list_users().await?))
}

/// Get a user by ID.
///
/// GET /users/{id}
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<UserId>,
) -> Result<Json<User>> {
    state
        .store()
        .get_user(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// Replace a user's fields.
///
/// PUT /users/{id}
///
/// An unknown ID answers 400 `Invalid User ID`.
pub async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<UserId>,
    ApiJson(payload): ApiJson<Value>,
) -> Result<Json<User>> {
    let input = NewUser::from_payload(&payload)?;

    state
        .store()
        .update_user(id, &input)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::BadRequest("Invalid User ID".to_string()))
}

/// Delete a user.
///
/// DELETE /users/{id}
///
/// Refused with 400 while the user still owns orders.
pub async fn destroy(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<UserId>,
) -> Result<Json<Message>> {
    if !state.store().delete_user(id).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    tracing::info!(user_id = %id, "User deleted");
    Ok(message("User removed"))
}
