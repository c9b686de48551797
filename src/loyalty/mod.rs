// Loyalty System Module
//
// Implements the loyalty accrual and redemption rules for the storefront:
// - Points calculation: base + bonus points from resolved order items
// - Points ledger: append-only signed entries with expiry, award/cancel/redeem
// - Coupon issuance: lifecycle-trigger evaluation and template-based minting
// - Checkout validation: coupon and points eligibility re-checks
//
// Templates and runtime settings are immutable values built at startup.

pub mod calculator;
pub mod code;
pub mod error;
pub mod handlers;
pub mod issuer;
pub mod ledger;
pub mod metrics;
pub mod templates;
pub mod types;
pub mod validator;

// Re-export commonly used types for convenience
pub use calculator::{ItemBreakdown, PointItem, PointsCalculation, PointsCalculator};
pub use error::{LoyaltyError, LoyaltyResult};
pub use issuer::{select_trigger, Coupon, CouponIssuer, CouponsRepository, IssuanceOutcome, UserLifecycle};
pub use ledger::{AwardOutcome, CancelOutcome, PointEntry, PointsLedger};
pub use metrics::PerformanceMetrics;
pub use templates::{CouponTemplate, TemplateCatalog};
pub use types::{CouponTemplateKey, DiscountType};
pub use validator::{
    evaluate_points, CheckoutValidator, CouponDecision, CouponRedemption, CouponRejection,
    CouponValidation, PointsDecision,
};

use crate::models::User;
use crate::notifications::{email::Mailer, NotificationsRepository};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Runtime settings for the loyalty system
///
/// Read once from the environment at startup and passed by reference.
#[derive(Debug, Clone)]
pub struct LoyaltySettings {
    /// Whether the global launch promotion trigger is active
    pub launch_promo_enabled: bool,

    /// Random characters appended after a coupon code prefix
    pub code_suffix_len: usize,
}

impl LoyaltySettings {
    /// Load settings from environment variables, with defaults
    pub fn from_env() -> Self {
        let launch_promo_enabled = std::env::var("LAUNCH_PROMO_ENABLED")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let code_suffix_len = std::env::var("COUPON_CODE_LENGTH")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(code::DEFAULT_SUFFIX_LEN);

        Self {
            launch_promo_enabled,
            code_suffix_len,
        }
    }
}

impl Default for LoyaltySettings {
    fn default() -> Self {
        Self {
            launch_promo_enabled: false,
            code_suffix_len: code::DEFAULT_SUFFIX_LEN,
        }
    }
}

/// Loyalty Engine
///
/// Coordinates the calculator, ledger, issuer and validator and provides a
/// unified interface for the order and checkout flows.
pub struct LoyaltyEngine {
    pool: PgPool,
    ledger: PointsLedger,
    issuer: CouponIssuer,
    validator: CheckoutValidator,
    metrics: Arc<PerformanceMetrics>,
}

impl LoyaltyEngine {
    /// Create a new LoyaltyEngine with the standard template catalog
    pub fn new(pool: PgPool, settings: LoyaltySettings) -> Self {
        let metrics = Arc::new(PerformanceMetrics::new());
        let notifications = NotificationsRepository::new(pool.clone());
        let mailer = Mailer::new(pool.clone());

        Self {
            ledger: PointsLedger::new(pool.clone(), notifications.clone()),
            issuer: CouponIssuer::new(
                pool.clone(),
                TemplateCatalog::standard(),
                settings,
                notifications,
                mailer,
            ),
            validator: CheckoutValidator::new(pool.clone()),
            metrics,
            pool,
        }
    }

    /// Get performance metrics
    pub fn metrics(&self) -> &PerformanceMetrics {
        &self.metrics
    }

    /// Calculate and award points for a completed order
    ///
    /// The ledger write and the order's points_awarded flag commit in one
    /// transaction; a second call for the same order is a no-op.
    pub async fn award_order_points(
        &self,
        order_id: Uuid,
        user_id: i32,
        items: &[PointItem],
    ) -> LoyaltyResult<AwardOutcome> {
        let calculation = {
            let _timer = self.metrics.start_calculation();
            PointsCalculator::calculate(items)?
        };

        let _timer = self.metrics.start_ledger_write();
        self.ledger.award(order_id, user_id, calculation).await
    }

    /// Reverse all positive point entries tied to an order
    pub async fn reverse_order_points(
        &self,
        order_id: Uuid,
        user_id: i32,
        reason: &str,
    ) -> LoyaltyResult<CancelOutcome> {
        let _timer = self.metrics.start_ledger_write();
        self.ledger.cancel(order_id, user_id, reason).await
    }

    /// Consume points at order finalization (atomic check-and-write)
    pub async fn redeem_points(
        &self,
        user_id: i32,
        amount: i32,
        order_id: Uuid,
    ) -> LoyaltyResult<PointEntry> {
        let _timer = self.metrics.start_ledger_write();
        self.ledger.redeem(user_id, amount, order_id).await
    }

    /// Non-expired points balance for a user
    pub async fn balance(&self, user_id: i32) -> LoyaltyResult<i64> {
        self.ledger.balance(user_id).await
    }

    /// Full ledger history for a user
    pub async fn history(&self, user_id: i32) -> LoyaltyResult<Vec<PointEntry>> {
        self.ledger.history(user_id).await
    }

    /// Run one coupon trigger evaluation pass for a user
    pub async fn evaluate_coupons(&self, user_id: i32) -> LoyaltyResult<IssuanceOutcome> {
        let _timer = self.metrics.start_issuance();

        let user = self.find_user(user_id).await?;
        self.issuer.evaluate_and_issue(&user).await
    }

    /// All coupons owned by a user
    pub async fn list_coupons(&self, user_id: i32) -> LoyaltyResult<Vec<Coupon>> {
        Ok(self.issuer.repository().list_for_user(user_id).await?)
    }

    /// Validate a submitted coupon code against the current cart
    pub async fn validate_coupon(
        &self,
        code: &str,
        user_id: i32,
        subtotal: Decimal,
    ) -> LoyaltyResult<CouponValidation> {
        let _timer = self.metrics.start_validation();
        self.validator.validate_coupon(code, user_id, subtotal).await
    }

    /// Redeem a coupon at order finalization (validate + mark used atomically)
    pub async fn redeem_coupon(
        &self,
        code: &str,
        user_id: i32,
        subtotal: Decimal,
    ) -> LoyaltyResult<CouponRedemption> {
        let _timer = self.metrics.start_validation();
        self.validator.redeem_coupon(code, user_id, subtotal).await
    }

    async fn find_user(&self, user_id: i32) -> LoyaltyResult<User> {
        crate::db::find_user(&self.pool, user_id)
            .await?
            .ok_or(LoyaltyError::UserNotFound(user_id))
    }
}
