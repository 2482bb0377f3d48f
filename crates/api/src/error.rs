//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. `AppError` renders as a JSON
//! body with a `message` field (plus `errors` for validation failures) and
//! captures server-side failures to Sentry before responding.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use ecommerce_core::ValidationErrors;

use crate::db::RepositoryError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Store operation failed.
    #[error("Database error: {0}")]
    Database(RepositoryError),

    /// Payload failed field validation.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A payload references an entity that does not exist.
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// The request conflicts with the current state (association exists,
    /// user still owns orders, ...).
    #[error("Conflict: {0}")]
    StateConflict(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Operation disabled on this server.
    #[error("Forbidden: {0}")]
    Forbidden(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) | Self::InvalidReference(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) | Self::StateConflict(_) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }

    /// Message shown to the client.
    fn public_message(&self) -> String {
        match self {
            // Don't expose internal error details to clients
            Self::Database(_) => "Internal server error".to_owned(),
            Self::Validation(_) => "Validation failed".to_owned(),
            Self::NotFound(msg)
            | Self::InvalidReference(msg)
            | Self::StateConflict(msg)
            | Self::BadRequest(msg)
            | Self::Forbidden(msg) => msg.clone(),
        }
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { resource, .. } => {
                Self::NotFound(format!("{resource} not found"))
            }
            RepositoryError::ForeignKey { resource, .. } => {
                Self::InvalidReference(format!("{resource} not found"))
            }
            RepositoryError::ConstraintViolation(msg) => Self::StateConflict(msg),
            RepositoryError::AlreadyAssociated { .. } => {
                Self::StateConflict("Product already in order".to_owned())
            }
            RepositoryError::NotAssociated { .. } => {
                Self::StateConflict("Product not in order".to_owned())
            }
            err @ (RepositoryError::Database(_) | RepositoryError::DataCorruption(_)) => {
                Self::Database(err)
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        // A segment that is not an integer ID cannot name any resource.
        tracing::debug!(error = %rejection.body_text(), "Unmatched path parameter");
        Self::NotFound("Not found".to_owned())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Database(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        let message = self.public_message();
        let body = match self {
            Self::Validation(errors) => json!({ "message": message, "errors": errors }),
            _ => json!({ "message": message }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;
    use ecommerce_core::{OrderId, ProductId};
    use serde_json::Value;

    use super::*;
    use crate::models::Resource;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("User not found".to_string());
        assert_eq!(err.to_string(), "Not found: User not found");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            let response = err.into_response();
            response.status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::InvalidReference("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::StateConflict("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Validation(ValidationErrors::new())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_repository_errors_map_to_http_categories() {
        let not_found: AppError = RepositoryError::NotFound {
            resource: Resource::Order,
            id: 3,
        }
        .into();
        assert!(matches!(&not_found, AppError::NotFound(msg) if msg == "Order not found"));

        let foreign_key: AppError = RepositoryError::ForeignKey {
            resource: Resource::User,
            id: 9,
        }
        .into();
        assert!(matches!(&foreign_key, AppError::InvalidReference(msg) if msg == "User not found"));

        let duplicate: AppError = RepositoryError::AlreadyAssociated {
            order_id: OrderId::new(1),
            product_id: ProductId::new(1),
        }
        .into();
        assert_eq!(duplicate.status(), StatusCode::BAD_REQUEST);

        let corrupt: AppError = RepositoryError::DataCorruption("bad".to_owned()).into();
        assert_eq!(corrupt.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let err: AppError = RepositoryError::DataCorruption("secret detail".to_owned()).into();
        let body = body_json(err.into_response()).await;
        assert_eq!(body, json!({ "message": "Internal server error" }));
    }

    #[tokio::test]
    async fn test_validation_body_lists_field_errors() {
        let mut errors = ValidationErrors::new();
        errors.add("name", "Missing data for required field.");

        let body = body_json(AppError::Validation(errors).into_response()).await;
        assert_eq!(body["message"], "Validation failed");
        assert_eq!(body["errors"]["name"][0], "Missing data for required field.");
    }
}
