// Coupon / Points Validator
//
// Checkout-time eligibility re-checks. Business-rule rejections are normal
// structured outcomes, not errors: handlers return them with HTTP 200.
// The decision functions are pure; the service wraps them with lookups,
// and coupon redemption re-runs the decision under a row lock before
// flipping is_used.

use crate::loyalty::error::LoyaltyResult;
use crate::loyalty::issuer::Coupon;
use crate::loyalty::types::DiscountType;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

/// Why a coupon cannot be applied
#[derive(Debug, Clone, PartialEq)]
pub enum CouponRejection {
    NotFound,
    AlreadyUsed,
    Expired,
    MinimumPurchaseNotMet { minimum: Decimal },
    WrongOwner,
}

impl CouponRejection {
    /// Inline message shown at checkout
    pub fn message(&self) -> String {
        match self {
            CouponRejection::NotFound => "Invalid coupon code".to_string(),
            CouponRejection::AlreadyUsed => "This coupon has already been used".to_string(),
            CouponRejection::Expired => "This coupon has expired".to_string(),
            CouponRejection::MinimumPurchaseNotMet { minimum } => {
                format!("Minimum purchase of {} not met", minimum)
            }
            CouponRejection::WrongOwner => "This coupon belongs to another user".to_string(),
        }
    }
}

/// Outcome of evaluating a coupon against a cart
#[derive(Debug, Clone, PartialEq)]
pub enum CouponDecision {
    Valid { discount: Decimal },
    Invalid(CouponRejection),
}

/// Evaluate an existing coupon against the submitting user and subtotal
///
/// Check order: used, expired, minimum purchase (inclusive boundary),
/// ownership. Lookup failure (no such code) is handled by the caller.
pub fn evaluate_coupon(
    coupon: &Coupon,
    user_id: i32,
    subtotal: Decimal,
    now: DateTime<Utc>,
) -> CouponDecision {
    if coupon.is_used {
        return CouponDecision::Invalid(CouponRejection::AlreadyUsed);
    }

    if coupon.expires_at < now {
        return CouponDecision::Invalid(CouponRejection::Expired);
    }

    if let Some(minimum) = coupon.minimum_purchase {
        if subtotal < minimum {
            return CouponDecision::Invalid(CouponRejection::MinimumPurchaseNotMet { minimum });
        }
    }

    if coupon.user_id != user_id {
        return CouponDecision::Invalid(CouponRejection::WrongOwner);
    }

    CouponDecision::Valid {
        discount: compute_discount(coupon, subtotal),
    }
}

/// Discount amount for a valid coupon
pub fn compute_discount(coupon: &Coupon, subtotal: Decimal) -> Decimal {
    match coupon.discount_type {
        DiscountType::Percentage => subtotal * coupon.discount_value / Decimal::from(100),
        DiscountType::Fixed => coupon.discount_value,
    }
}

/// Outcome of checking a requested points amount against a balance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointsDecision {
    Usable,
    NegativeAmount,
    InsufficientBalance { available: i64 },
}

impl PointsDecision {
    pub fn message(&self) -> String {
        match self {
            PointsDecision::Usable => "Points are available".to_string(),
            PointsDecision::NegativeAmount => "Points amount cannot be negative".to_string(),
            PointsDecision::InsufficientBalance { available } => {
                format!("Only {} points are available", available)
            }
        }
    }
}

/// Check a requested points amount against the non-expired balance
///
/// Requesting exactly the available sum succeeds; this endpoint never
/// deducts anything.
pub fn evaluate_points(requested: i32, available: i64) -> PointsDecision {
    if requested < 0 {
        return PointsDecision::NegativeAmount;
    }

    if i64::from(requested) > available {
        return PointsDecision::InsufficientBalance { available };
    }

    PointsDecision::Usable
}

/// Structured result of a coupon validation request
#[derive(Debug)]
pub struct CouponValidation {
    pub valid: bool,
    pub coupon: Option<Coupon>,
    pub discount: Option<Decimal>,
    pub message: String,
}

/// Result of a redemption attempt at order finalization
#[derive(Debug)]
pub enum CouponRedemption {
    Redeemed { coupon: Coupon, discount: Decimal },
    Rejected { message: String },
}

/// Checkout-time validator service
#[derive(Clone)]
pub struct CheckoutValidator {
    pool: PgPool,
}

impl CheckoutValidator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Validate a submitted coupon code against the current cart
    pub async fn validate_coupon(
        &self,
        code: &str,
        user_id: i32,
        subtotal: Decimal,
    ) -> LoyaltyResult<CouponValidation> {
        let coupon = sqlx::query_as::<_, Coupon>(
            r#"
            SELECT id, user_id, code, discount_type, discount_value, minimum_purchase,
                   template_key, description, expires_at, is_used, created_at
            FROM coupons
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        let Some(coupon) = coupon else {
            tracing::debug!("Coupon validation failed: code '{}' not found", code);
            return Ok(CouponValidation {
                valid: false,
                coupon: None,
                discount: None,
                message: CouponRejection::NotFound.message(),
            });
        };

        match evaluate_coupon(&coupon, user_id, subtotal, Utc::now()) {
            CouponDecision::Valid { discount } => Ok(CouponValidation {
                valid: true,
                coupon: Some(coupon),
                discount: Some(discount),
                message: "Coupon is valid".to_string(),
            }),
            CouponDecision::Invalid(rejection) => {
                tracing::debug!(
                    "Coupon '{}' rejected for user {}: {}",
                    code,
                    user_id,
                    rejection.message()
                );
                Ok(CouponValidation {
                    valid: false,
                    coupon: None,
                    discount: None,
                    message: rejection.message(),
                })
            }
        }
    }

    /// Redeem a coupon at order finalization
    ///
    /// Locks the coupon row, re-runs the full eligibility decision and sets
    /// is_used inside the same transaction so two orders cannot consume one
    /// coupon.
    pub async fn redeem_coupon(
        &self,
        code: &str,
        user_id: i32,
        subtotal: Decimal,
    ) -> LoyaltyResult<CouponRedemption> {
        let mut tx = self.pool.begin().await?;

        let coupon = sqlx::query_as::<_, Coupon>(
            r#"
            SELECT id, user_id, code, discount_type, discount_value, minimum_purchase,
                   template_key, description, expires_at, is_used, created_at
            FROM coupons
            WHERE code = $1
            FOR UPDATE
            "#,
        )
        .bind(code)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(coupon) = coupon else {
            return Ok(CouponRedemption::Rejected {
                message: CouponRejection::NotFound.message(),
            });
        };

        match evaluate_coupon(&coupon, user_id, subtotal, Utc::now()) {
            CouponDecision::Invalid(rejection) => Ok(CouponRedemption::Rejected {
                message: rejection.message(),
            }),
            CouponDecision::Valid { discount } => {
                let coupon = sqlx::query_as::<_, Coupon>(
                    r#"
                    UPDATE coupons
                    SET is_used = TRUE
                    WHERE id = $1
                    RETURNING id, user_id, code, discount_type, discount_value, minimum_purchase,
                              template_key, description, expires_at, is_used, created_at
                    "#,
                )
                .bind(coupon.id)
                .fetch_one(&mut *tx)
                .await?;

                tx.commit().await?;

                tracing::info!("Coupon {} redeemed by user {}", coupon.code, user_id);
                Ok(CouponRedemption::Redeemed { coupon, discount })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loyalty::types::CouponTemplateKey;
    use chrono::Duration;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn coupon(user_id: i32) -> Coupon {
        Coupon {
            id: Uuid::new_v4(),
            user_id,
            code: "WELCOME-ABCDEFGH".to_string(),
            discount_type: DiscountType::Percentage,
            discount_value: dec!(10),
            minimum_purchase: Some(dec!(2000)),
            template_key: CouponTemplateKey::Welcome,
            description: "Welcome discount for new members".to_string(),
            expires_at: Utc::now() + Duration::days(30),
            is_used: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_valid_coupon_computes_percentage_discount() {
        let c = coupon(1);
        let decision = evaluate_coupon(&c, 1, dec!(3000), Utc::now());

        assert_eq!(
            decision,
            CouponDecision::Valid {
                discount: dec!(300)
            }
        );
    }

    #[test]
    fn test_fixed_discount_is_the_face_value() {
        let mut c = coupon(1);
        c.discount_type = DiscountType::Fixed;
        c.discount_value = dec!(1000);
        c.minimum_purchase = Some(dec!(5000));

        let decision = evaluate_coupon(&c, 1, dec!(6000), Utc::now());
        assert_eq!(
            decision,
            CouponDecision::Valid {
                discount: dec!(1000)
            }
        );
    }

    #[test]
    fn test_used_coupon_is_rejected_first() {
        let mut c = coupon(1);
        c.is_used = true;
        // Also expired; "already used" wins the check order
        c.expires_at = Utc::now() - Duration::days(1);

        let decision = evaluate_coupon(&c, 1, dec!(3000), Utc::now());
        assert_eq!(decision, CouponDecision::Invalid(CouponRejection::AlreadyUsed));
    }

    #[test]
    fn test_expired_coupon_fails_regardless_of_other_fields() {
        let mut c = coupon(1);
        c.expires_at = Utc::now() - Duration::seconds(1);
        c.minimum_purchase = None;

        let decision = evaluate_coupon(&c, 1, dec!(1_000_000), Utc::now());
        assert_eq!(decision, CouponDecision::Invalid(CouponRejection::Expired));
    }

    #[test]
    fn test_minimum_purchase_boundary_is_inclusive() {
        let mut c = coupon(1);
        c.minimum_purchase = Some(dec!(5000));

        let below = evaluate_coupon(&c, 1, dec!(4999), Utc::now());
        assert_eq!(
            below,
            CouponDecision::Invalid(CouponRejection::MinimumPurchaseNotMet {
                minimum: dec!(5000)
            })
        );

        let at = evaluate_coupon(&c, 1, dec!(5000), Utc::now());
        assert!(matches!(at, CouponDecision::Valid { .. }));
    }

    #[test]
    fn test_coupon_of_another_user_is_rejected() {
        let c = coupon(1);
        let decision = evaluate_coupon(&c, 2, dec!(3000), Utc::now());
        assert_eq!(decision, CouponDecision::Invalid(CouponRejection::WrongOwner));
    }

    #[test]
    fn test_no_minimum_accepts_any_subtotal() {
        let mut c = coupon(1);
        c.minimum_purchase = None;

        let decision = evaluate_coupon(&c, 1, dec!(1), Utc::now());
        assert!(matches!(decision, CouponDecision::Valid { .. }));
    }

    #[test]
    fn test_points_negative_amount_fails() {
        assert_eq!(evaluate_points(-1, 100), PointsDecision::NegativeAmount);
    }

    #[test]
    fn test_points_exceeding_balance_fails() {
        assert_eq!(
            evaluate_points(101, 100),
            PointsDecision::InsufficientBalance { available: 100 }
        );
    }

    #[test]
    fn test_points_exact_balance_succeeds() {
        assert_eq!(evaluate_points(100, 100), PointsDecision::Usable);
        assert_eq!(evaluate_points(0, 0), PointsDecision::Usable);
    }

    #[test]
    fn test_rejection_messages() {
        assert_eq!(CouponRejection::NotFound.message(), "Invalid coupon code");
        assert_eq!(
            CouponRejection::MinimumPurchaseNotMet { minimum: dec!(5000) }.message(),
            "Minimum purchase of 5000 not met"
        );
        assert_eq!(
            PointsDecision::InsufficientBalance { available: 42 }.message(),
            "Only 42 points are available"
        );
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::loyalty::types::CouponTemplateKey;
    use chrono::Duration;
    use proptest::prelude::*;
    use uuid::Uuid;

    proptest! {
        /// An expired coupon never validates, whatever the subtotal or owner
        #[test]
        fn prop_expired_never_valid(subtotal in 0u32..=1_000_000, owner in 1i32..100, caller in 1i32..100) {
            let coupon = Coupon {
                id: Uuid::new_v4(),
                user_id: owner,
                code: "BDAY-XYZWVUTS".to_string(),
                discount_type: DiscountType::Percentage,
                discount_value: Decimal::from(15),
                minimum_purchase: None,
                template_key: CouponTemplateKey::Birthday,
                description: "Birthday month discount".to_string(),
                expires_at: Utc::now() - Duration::seconds(5),
                is_used: false,
                created_at: Utc::now() - Duration::days(40),
            };

            let decision = evaluate_coupon(&coupon, caller, Decimal::from(subtotal), Utc::now());
            prop_assert_eq!(decision, CouponDecision::Invalid(CouponRejection::Expired));
        }

        /// The points decision accepts exactly the requests within balance
        #[test]
        fn prop_points_decision_matches_balance(requested in 0i32..=10_000, available in 0i64..=10_000) {
            let decision = evaluate_points(requested, available);

            if i64::from(requested) <= available {
                prop_assert_eq!(decision, PointsDecision::Usable);
            } else {
                prop_assert_eq!(decision, PointsDecision::InsufficientBalance { available });
            }
        }
    }
}
