//! Administrative route handlers.

use axum::{Json, body::Bytes, extract::State};
use serde::Deserialize;

use super::{Message, message};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Value the `confirm` field must carry for a reset to run.
pub const RESET_CONFIRMATION: &str = "reset-database";

#[derive(Debug, Deserialize)]
struct ResetRequest {
    confirm: String,
}

/// Drop and recreate all storage.
///
/// POST /reset-database
///
/// Disabled (403) unless the server runs with `API_ALLOW_RESET=true`. The
/// body must be `{"confirm": "reset-database"}`, otherwise 400.
pub async fn reset_database(State(state): State<AppState>, body: Bytes) -> Result<Json<Message>> {
    if !state.config().allow_reset {
        tracing::warn!("Rejected database reset: API_ALLOW_RESET is not enabled");
        return Err(AppError::Forbidden("Database reset is disabled".to_string()));
    }

    let confirmed = serde_json::from_slice::<ResetRequest>(&body)
        .is_ok_and(|request| request.confirm == RESET_CONFIRMATION);
    if !confirmed {
        return Err(AppError::BadRequest(format!(
            "Confirm the reset with {{\"confirm\": \"{RESET_CONFIRMATION}\"}}"
        )));
    }

    state.store().reset().await?;
    Ok(message("Database reset successfully"))
}
