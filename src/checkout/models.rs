use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::loyalty::issuer::Coupon;

/// Request DTO for coupon validation at checkout
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ValidateCouponRequest {
    #[validate(length(min = 1, message = "Coupon code must not be empty"))]
    pub code: String,

    pub subtotal: Decimal,
}

/// Response DTO for coupon validation
///
/// Business-rule rejections are reported here with HTTP 200, never as an
/// error status.
#[derive(Debug, Serialize, ToSchema)]
pub struct ValidateCouponResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon: Option<Coupon>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<Decimal>,
    pub message: String,
}

/// Request DTO for points validation at checkout
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ApplyPointsRequest {
    pub points_to_use: i32,

    /// The order the points are intended for; informational at this stage
    pub order_id: Option<uuid::Uuid>,
}

/// Response DTO for points validation
///
/// This endpoint only confirms the amount is usable; consumption happens
/// at order finalization.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApplyPointsResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validated_points: Option<i32>,
    pub message: String,
}
