// HTTP handlers for checkout-time validation endpoints
//
// Eligibility failures are business outcomes: both endpoints answer them
// with HTTP 200 and a message, reserving error statuses for infrastructure
// faults.

use axum::{extract::State, Json};
use validator::Validate;

use crate::auth::middleware::AuthenticatedUser;
use crate::checkout::models::{
    ApplyPointsRequest, ApplyPointsResponse, ValidateCouponRequest, ValidateCouponResponse,
};
use crate::loyalty::{evaluate_points, LoyaltyError, PointsDecision};

/// Handler for POST /api/checkout/validate-coupon
/// Re-checks a submitted coupon code against the current cart subtotal
#[utoipa::path(
    post,
    path = "/api/checkout/validate-coupon",
    request_body = ValidateCouponRequest,
    responses(
        (status = 200, description = "Validation outcome (valid or rejected)", body = ValidateCouponResponse),
        (status = 400, description = "Malformed request"),
        (status = 500, description = "Internal server error")
    ),
    tag = "checkout"
)]
pub async fn validate_coupon_handler(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Json(request): Json<ValidateCouponRequest>,
) -> Result<Json<ValidateCouponResponse>, LoyaltyError> {
    request.validate()?;

    tracing::debug!(
        "Validating coupon '{}' for user {} against subtotal {}",
        request.code,
        user.user_id,
        request.subtotal
    );

    let validation = state
        .loyalty
        .validate_coupon(&request.code, user.user_id, request.subtotal)
        .await?;

    Ok(Json(ValidateCouponResponse {
        valid: validation.valid,
        coupon: validation.coupon,
        discount: validation.discount,
        message: validation.message,
    }))
}

/// Handler for POST /api/checkout/apply-points
/// Confirms a requested points amount is covered by the user's non-expired
/// balance; nothing is deducted here
#[utoipa::path(
    post,
    path = "/api/checkout/apply-points",
    request_body = ApplyPointsRequest,
    responses(
        (status = 200, description = "Validation outcome (usable or rejected)", body = ApplyPointsResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "checkout"
)]
pub async fn apply_points_handler(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Json(request): Json<ApplyPointsRequest>,
) -> Result<Json<ApplyPointsResponse>, LoyaltyError> {
    let available = state.loyalty.balance(user.user_id).await?;

    let response = match evaluate_points(request.points_to_use, available) {
        PointsDecision::Usable => ApplyPointsResponse {
            success: true,
            validated_points: Some(request.points_to_use),
            message: "Points are available".to_string(),
        },
        decision => {
            tracing::debug!(
                "Points validation failed for user {}: {}",
                user.user_id,
                decision.message()
            );
            ApplyPointsResponse {
                success: false,
                validated_points: None,
                message: decision.message(),
            }
        }
    };

    Ok(Json(response))
}
