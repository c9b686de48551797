// Checkout module
//
// Checkout-time validation endpoints for coupons and points. These only
// re-check eligibility; consumption happens during order completion.

pub mod handlers;
pub mod models;

pub use models::{
    ApplyPointsRequest, ApplyPointsResponse, ValidateCouponRequest, ValidateCouponResponse,
};
