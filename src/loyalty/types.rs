// Domain type definitions for the loyalty system
// Provides shared types used by the ledger, issuer and validator

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Type of discount carried by a coupon
///
/// Determines how the discount value should be interpreted when a coupon
/// is applied to a cart subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// Discount is a percentage of the subtotal (e.g., 10 = 10% off)
    Percentage,

    /// Discount is a fixed amount subtracted from the subtotal
    Fixed,
}

impl fmt::Display for DiscountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscountType::Percentage => write!(f, "percentage"),
            DiscountType::Fixed => write!(f, "fixed"),
        }
    }
}

impl std::str::FromStr for DiscountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percentage" => Ok(DiscountType::Percentage),
            "fixed" => Ok(DiscountType::Fixed),
            _ => Err(format!("Invalid discount type: {}", s)),
        }
    }
}

/// Lifecycle trigger / template key for issued coupons
///
/// Each key names one fixed template in the catalog and one trigger in the
/// issuer's precedence list. Stored as text on the coupon row so prior
/// issuances can be checked per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CouponTemplateKey {
    /// Account created within the last 7 days
    Welcome,

    /// Exactly one completed order
    FirstOrder,

    /// More than 90 days since the most recent order
    Reactivation,

    /// Birth month equals the current month
    Birthday,

    /// Global launch promotion flag is enabled
    Launch,
}

impl fmt::Display for CouponTemplateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CouponTemplateKey::Welcome => write!(f, "welcome"),
            CouponTemplateKey::FirstOrder => write!(f, "first_order"),
            CouponTemplateKey::Reactivation => write!(f, "reactivation"),
            CouponTemplateKey::Birthday => write!(f, "birthday"),
            CouponTemplateKey::Launch => write!(f, "launch"),
        }
    }
}

impl std::str::FromStr for CouponTemplateKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "welcome" => Ok(CouponTemplateKey::Welcome),
            "first_order" => Ok(CouponTemplateKey::FirstOrder),
            "reactivation" => Ok(CouponTemplateKey::Reactivation),
            "birthday" => Ok(CouponTemplateKey::Birthday),
            "launch" => Ok(CouponTemplateKey::Launch),
            _ => Err(format!("Invalid coupon template key: {}", s)),
        }
    }
}
