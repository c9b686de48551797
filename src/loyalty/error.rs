// Error types for the loyalty system
// Covers calculation, ledger, issuance and validation failures

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Main error type for the loyalty system
///
/// Business-rule non-satisfaction (expired coupon, insufficient balance and
/// the like) is NOT represented here; those are normal structured outcomes
/// returned by the validator. This enum covers lookup failures and
/// infrastructure faults, which are caught at the handler boundary and
/// converted to a `{ success: false, error }` response.
#[derive(Debug, Error)]
pub enum LoyaltyError {
    /// Malformed request payloads, converted from validator errors
    #[error("Validation failed: {0}")]
    ValidationError(String),

    /// Database operation errors, automatically converted from sqlx::Error
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// Referenced user does not exist
    #[error("User not found: {0}")]
    UserNotFound(i32),

    /// Referenced order does not exist
    #[error("Order not found: {0}")]
    OrderNotFound(Uuid),

    /// Arithmetic failures while computing points
    #[error("Calculation error: {0}")]
    CalculationError(String),

    /// Unique coupon code could not be generated after retries
    #[error("Coupon code generation failed: {0}")]
    CodeGeneration(String),

    /// Redemption requested more points than the locked balance covers
    #[error("Insufficient points: requested {requested}, available {available}")]
    InsufficientPoints { requested: i32, available: i64 },

    /// Email template rendering failure
    #[error("Email rendering error: {0}")]
    EmailRender(String),

    /// Missing or inconsistent runtime configuration
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type alias for loyalty operations
pub type LoyaltyResult<T> = Result<T, LoyaltyError>;

impl From<validator::ValidationErrors> for LoyaltyError {
    fn from(err: validator::ValidationErrors) -> Self {
        LoyaltyError::ValidationError(err.to_string())
    }
}

impl From<crate::notifications::email::EmailError> for LoyaltyError {
    fn from(err: crate::notifications::email::EmailError) -> Self {
        match err {
            crate::notifications::email::EmailError::Render(e) => {
                LoyaltyError::EmailRender(e.to_string())
            }
            crate::notifications::email::EmailError::Database(e) => LoyaltyError::DatabaseError(e),
        }
    }
}

impl IntoResponse for LoyaltyError {
    fn into_response(self) -> Response {
        let status = match &self {
            LoyaltyError::ValidationError(_) => StatusCode::BAD_REQUEST,
            LoyaltyError::DatabaseError(e) => {
                tracing::error!("Database error in loyalty operation: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            LoyaltyError::UserNotFound(_) | LoyaltyError::OrderNotFound(_) => StatusCode::NOT_FOUND,
            LoyaltyError::CalculationError(msg) => {
                tracing::error!("Calculation error: {}", msg);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            LoyaltyError::CodeGeneration(msg) => {
                tracing::error!("Code generation error: {}", msg);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            LoyaltyError::InsufficientPoints { .. } => StatusCode::BAD_REQUEST,
            LoyaltyError::EmailRender(msg) => {
                tracing::error!("Email rendering error: {}", msg);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            LoyaltyError::Configuration(msg) => {
                tracing::error!("Configuration error: {}", msg);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // Infrastructure details are logged above; the client sees the
        // display message only for non-500 variants.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "success": false,
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = LoyaltyError::UserNotFound(42);
        assert_eq!(error.to_string(), "User not found: 42");

        let error = LoyaltyError::InsufficientPoints {
            requested: 500,
            available: 120,
        };
        assert_eq!(
            error.to_string(),
            "Insufficient points: requested 500, available 120"
        );

        let error = LoyaltyError::CalculationError("overflow".to_string());
        assert_eq!(error.to_string(), "Calculation error: overflow");
    }

    #[test]
    fn test_error_from_sqlx() {
        let sqlx_error = sqlx::Error::RowNotFound;
        let loyalty_error: LoyaltyError = sqlx_error.into();
        assert!(matches!(loyalty_error, LoyaltyError::DatabaseError(_)));
    }
}
