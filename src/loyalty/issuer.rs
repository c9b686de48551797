// Coupon Issuer
//
// Evaluates user lifecycle triggers in a fixed precedence order and mints a
// coupon from the matching template: unique human-enterable code, computed
// expiry, coupon row, notification and a templated email in the outbox.

use crate::loyalty::code::generate_code;
use crate::loyalty::error::{LoyaltyError, LoyaltyResult};
use crate::loyalty::templates::{CouponTemplate, TemplateCatalog};
use crate::loyalty::types::{CouponTemplateKey, DiscountType};
use crate::loyalty::LoyaltySettings;
use crate::models::User;
use crate::notifications::email::{CouponEmail, Mailer};
use crate::notifications::{NotificationKind, NotificationsRepository};
use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use std::collections::HashSet;
use utoipa::ToSchema;
use uuid::Uuid;

/// Maximum attempts to find an unused coupon code before giving up
const MAX_CODE_ATTEMPTS: usize = 5;

/// A minted coupon owned by exactly one user
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Coupon {
    pub id: Uuid,
    pub user_id: i32,
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub minimum_purchase: Option<Decimal>,
    pub template_key: CouponTemplateKey,
    pub description: String,
    pub expires_at: DateTime<Utc>,
    pub is_used: bool,
    pub created_at: DateTime<Utc>,
}

/// Result of one trigger evaluation pass
#[derive(Debug)]
pub struct IssuanceOutcome {
    pub coupon_issued: bool,
    pub coupon: Option<Coupon>,
}

/// Snapshot of the lifecycle facts the triggers are evaluated against
#[derive(Debug, Clone)]
pub struct UserLifecycle {
    pub created_at: DateTime<Utc>,
    pub birthdate: Option<NaiveDate>,
    pub completed_orders: i64,
    pub last_order_at: Option<DateTime<Utc>>,
    pub held_templates: HashSet<CouponTemplateKey>,
    pub birthday_coupon_this_year: bool,
}

/// Trigger evaluation order; the first applicable trigger wins
pub const TRIGGER_PRECEDENCE: [CouponTemplateKey; 5] = [
    CouponTemplateKey::Welcome,
    CouponTemplateKey::FirstOrder,
    CouponTemplateKey::Reactivation,
    CouponTemplateKey::Birthday,
    CouponTemplateKey::Launch,
];

/// Whether a single trigger applies to the lifecycle snapshot
fn trigger_applies(
    key: CouponTemplateKey,
    lifecycle: &UserLifecycle,
    launch_promo_enabled: bool,
    now: DateTime<Utc>,
) -> bool {
    match key {
        // Account younger than 7 days, strict comparison: exactly 7*24h is out
        CouponTemplateKey::Welcome => {
            now - lifecycle.created_at < Duration::days(7)
                && !lifecycle.held_templates.contains(&CouponTemplateKey::Welcome)
        }
        CouponTemplateKey::FirstOrder => lifecycle.completed_orders == 1,
        CouponTemplateKey::Reactivation => lifecycle
            .last_order_at
            .map(|last| now - last > Duration::days(90))
            .unwrap_or(false),
        CouponTemplateKey::Birthday => {
            lifecycle
                .birthdate
                .map(|b| b.month() == now.month())
                .unwrap_or(false)
                && !lifecycle.birthday_coupon_this_year
        }
        CouponTemplateKey::Launch => {
            launch_promo_enabled
                && !lifecycle.held_templates.contains(&CouponTemplateKey::Launch)
        }
    }
}

/// Select the first applicable trigger in precedence order
pub fn select_trigger(
    lifecycle: &UserLifecycle,
    launch_promo_enabled: bool,
    now: DateTime<Utc>,
) -> Option<CouponTemplateKey> {
    TRIGGER_PRECEDENCE
        .into_iter()
        .find(|key| trigger_applies(*key, lifecycle, launch_promo_enabled, now))
}

/// Repository for coupon rows
#[derive(Clone)]
pub struct CouponsRepository {
    pool: PgPool,
}

impl CouponsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a coupon by its code
    pub async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, sqlx::Error> {
        sqlx::query_as::<_, Coupon>(
            r#"
            SELECT id, user_id, code, discount_type, discount_value, minimum_purchase,
                   template_key, description, expires_at, is_used, created_at
            FROM coupons
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
    }

    /// All coupons owned by a user, newest first
    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<Coupon>, sqlx::Error> {
        sqlx::query_as::<_, Coupon>(
            r#"
            SELECT id, user_id, code, discount_type, discount_value, minimum_purchase,
                   template_key, description, expires_at, is_used, created_at
            FROM coupons
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Distinct template keys the user already holds
    pub async fn held_template_keys(
        &self,
        user_id: i32,
    ) -> Result<Vec<CouponTemplateKey>, sqlx::Error> {
        sqlx::query_scalar::<_, CouponTemplateKey>(
            "SELECT DISTINCT template_key FROM coupons WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Whether a birthday coupon was already issued this calendar year
    pub async fn birthday_issued_this_year(&self, user_id: i32) -> Result<bool, sqlx::Error> {
        let exists: Option<bool> = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM coupons
                WHERE user_id = $1
                  AND template_key = 'birthday'
                  AND created_at >= date_trunc('year', NOW())
            )
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists.unwrap_or(false))
    }

    /// Whether a code is already taken
    pub async fn code_exists(&self, code: &str) -> Result<bool, sqlx::Error> {
        let exists: Option<bool> =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM coupons WHERE code = $1)")
                .bind(code)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists.unwrap_or(false))
    }

    /// Insert a coupon minted from a template
    pub async fn insert(
        &self,
        user_id: i32,
        code: &str,
        template: &CouponTemplate,
        expires_at: DateTime<Utc>,
    ) -> Result<Coupon, sqlx::Error> {
        sqlx::query_as::<_, Coupon>(
            r#"
            INSERT INTO coupons
                (user_id, code, discount_type, discount_value, minimum_purchase,
                 template_key, description, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, user_id, code, discount_type, discount_value, minimum_purchase,
                      template_key, description, expires_at, is_used, created_at
            "#,
        )
        .bind(user_id)
        .bind(code)
        .bind(template.discount_type)
        .bind(template.discount_value)
        .bind(template.minimum_purchase)
        .bind(template.key)
        .bind(template.description)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await
    }
}

/// Coupon Issuer
pub struct CouponIssuer {
    pool: PgPool,
    repo: CouponsRepository,
    catalog: TemplateCatalog,
    settings: LoyaltySettings,
    notifications: NotificationsRepository,
    mailer: Mailer,
}

impl CouponIssuer {
    pub fn new(
        pool: PgPool,
        catalog: TemplateCatalog,
        settings: LoyaltySettings,
        notifications: NotificationsRepository,
        mailer: Mailer,
    ) -> Self {
        Self {
            repo: CouponsRepository::new(pool.clone()),
            pool,
            catalog,
            settings,
            notifications,
            mailer,
        }
    }

    pub fn repository(&self) -> &CouponsRepository {
        &self.repo
    }

    /// Load the lifecycle snapshot the triggers are evaluated against
    async fn load_lifecycle(&self, user: &User) -> LoyaltyResult<UserLifecycle> {
        let completed_orders: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM orders WHERE user_id = $1 AND status = 'completed'",
        )
        .bind(user.id)
        .fetch_one(&self.pool)
        .await?;

        let last_order_at: Option<DateTime<Utc>> =
            sqlx::query_scalar("SELECT MAX(created_at) FROM orders WHERE user_id = $1")
                .bind(user.id)
                .fetch_one(&self.pool)
                .await?;

        let held_templates: HashSet<CouponTemplateKey> = self
            .repo
            .held_template_keys(user.id)
            .await?
            .into_iter()
            .collect();

        let birthday_coupon_this_year = self.repo.birthday_issued_this_year(user.id).await?;

        Ok(UserLifecycle {
            created_at: user.created_at,
            birthdate: user.birthdate,
            completed_orders,
            last_order_at,
            held_templates,
            birthday_coupon_this_year,
        })
    }

    /// Run one trigger evaluation pass for a user
    ///
    /// The first applicable trigger (in precedence order) issues its
    /// template and the pass returns; no match is a successful no-op.
    pub async fn evaluate_and_issue(&self, user: &User) -> LoyaltyResult<IssuanceOutcome> {
        let lifecycle = self.load_lifecycle(user).await?;
        let now = Utc::now();

        let Some(key) = select_trigger(&lifecycle, self.settings.launch_promo_enabled, now) else {
            tracing::debug!("No coupon trigger applies for user {}", user.id);
            return Ok(IssuanceOutcome {
                coupon_issued: false,
                coupon: None,
            });
        };

        tracing::info!("Coupon trigger '{}' applies for user {}", key, user.id);

        let template = self.catalog.get(key).ok_or_else(|| {
            LoyaltyError::Configuration(format!("No template configured for trigger '{}'", key))
        })?;

        let coupon = self.issue(user, template, now).await?;

        Ok(IssuanceOutcome {
            coupon_issued: true,
            coupon: Some(coupon),
        })
    }

    /// Mint a coupon from a template: unique code, expiry, row, notification
    /// and outbox email
    async fn issue(
        &self,
        user: &User,
        template: &CouponTemplate,
        now: DateTime<Utc>,
    ) -> LoyaltyResult<Coupon> {
        let mut code = None;
        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let candidate = generate_code(template.code_prefix, self.settings.code_suffix_len);
            if !self.repo.code_exists(&candidate).await? {
                code = Some(candidate);
                break;
            }
            tracing::debug!(
                "Coupon code collision on attempt {} for prefix {}",
                attempt,
                template.code_prefix
            );
        }

        let code = code.ok_or_else(|| {
            LoyaltyError::CodeGeneration(format!(
                "No unique code found after {} attempts",
                MAX_CODE_ATTEMPTS
            ))
        })?;

        let expires_at = now + Months::new(template.validity_months);
        let coupon = self.repo.insert(user.id, &code, template, expires_at).await?;

        tracing::info!(
            "Issued '{}' coupon {} to user {}, expires {}",
            template.key,
            coupon.code,
            user.id,
            coupon.expires_at.format("%Y-%m-%d")
        );

        self.notifications
            .insert(
                user.id,
                NotificationKind::CouponIssued,
                "A new coupon is waiting for you",
                &format!(
                    "{}: use code {} by {}.",
                    template.description,
                    coupon.code,
                    coupon.expires_at.format("%B %e, %Y")
                ),
            )
            .await?;

        self.mailer
            .queue_coupon_email(
                user.id,
                &user.email,
                CouponEmail {
                    recipient_name: &user.name,
                    code: &coupon.code,
                    description: template.description,
                    discount_text: &discount_text(template),
                    minimum_text: &minimum_text(template),
                    expires_text: &coupon.expires_at.format("%B %e, %Y").to_string(),
                },
            )
            .await?;

        Ok(coupon)
    }
}

/// Human-readable discount phrase for a template
fn discount_text(template: &CouponTemplate) -> String {
    match template.discount_type {
        DiscountType::Percentage => format!("{}% off", template.discount_value),
        DiscountType::Fixed => format!("{} off", template.discount_value),
    }
}

/// Human-readable minimum-purchase phrase for a template
fn minimum_text(template: &CouponTemplate) -> String {
    match template.minimum_purchase {
        Some(minimum) => format!("Valid on orders of {} or more.", minimum),
        None => "No minimum purchase required.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn base_lifecycle(now: DateTime<Utc>) -> UserLifecycle {
        UserLifecycle {
            created_at: now - Duration::days(400),
            birthdate: None,
            completed_orders: 0,
            last_order_at: None,
            held_templates: HashSet::new(),
            birthday_coupon_this_year: false,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_new_user_gets_welcome() {
        let now = now();
        let mut lifecycle = base_lifecycle(now);
        lifecycle.created_at = now - Duration::days(3);

        assert_eq!(
            select_trigger(&lifecycle, false, now),
            Some(CouponTemplateKey::Welcome)
        );
    }

    #[test]
    fn test_welcome_cutoff_is_strict_at_seven_days() {
        let now = now();
        let mut lifecycle = base_lifecycle(now);

        // Exactly 7*24h old: not eligible
        lifecycle.created_at = now - Duration::days(7);
        assert_eq!(select_trigger(&lifecycle, false, now), None);

        // One second younger than the cutoff: eligible
        lifecycle.created_at = now - Duration::days(7) + Duration::seconds(1);
        assert_eq!(
            select_trigger(&lifecycle, false, now),
            Some(CouponTemplateKey::Welcome)
        );

        // 8 days old: never eligible
        lifecycle.created_at = now - Duration::days(8);
        assert_eq!(select_trigger(&lifecycle, false, now), None);
    }

    #[test]
    fn test_welcome_not_reissued() {
        let now = now();
        let mut lifecycle = base_lifecycle(now);
        lifecycle.created_at = now - Duration::days(2);
        lifecycle.held_templates.insert(CouponTemplateKey::Welcome);

        assert_eq!(select_trigger(&lifecycle, false, now), None);
    }

    #[test]
    fn test_welcome_precedes_first_order() {
        let now = now();
        let mut lifecycle = base_lifecycle(now);
        lifecycle.created_at = now - Duration::days(3);
        lifecycle.completed_orders = 1;

        assert_eq!(
            select_trigger(&lifecycle, false, now),
            Some(CouponTemplateKey::Welcome)
        );
    }

    #[test]
    fn test_first_order_requires_exactly_one() {
        let now = now();
        let mut lifecycle = base_lifecycle(now);

        lifecycle.completed_orders = 1;
        assert_eq!(
            select_trigger(&lifecycle, false, now),
            Some(CouponTemplateKey::FirstOrder)
        );

        lifecycle.completed_orders = 2;
        assert_eq!(select_trigger(&lifecycle, false, now), None);
    }

    #[test]
    fn test_reactivation_after_ninety_days() {
        let now = now();
        let mut lifecycle = base_lifecycle(now);
        lifecycle.completed_orders = 4;

        lifecycle.last_order_at = Some(now - Duration::days(91));
        assert_eq!(
            select_trigger(&lifecycle, false, now),
            Some(CouponTemplateKey::Reactivation)
        );

        // Exactly 90 days is not "more than 90"
        lifecycle.last_order_at = Some(now - Duration::days(90));
        assert_eq!(select_trigger(&lifecycle, false, now), None);

        // Never ordered: no reactivation
        lifecycle.last_order_at = None;
        assert_eq!(select_trigger(&lifecycle, false, now), None);
    }

    #[test]
    fn test_birthday_month_once_per_year() {
        let now = now(); // June
        let mut lifecycle = base_lifecycle(now);
        lifecycle.birthdate = NaiveDate::from_ymd_opt(1990, 6, 2);

        assert_eq!(
            select_trigger(&lifecycle, false, now),
            Some(CouponTemplateKey::Birthday)
        );

        lifecycle.birthday_coupon_this_year = true;
        assert_eq!(select_trigger(&lifecycle, false, now), None);

        lifecycle.birthday_coupon_this_year = false;
        lifecycle.birthdate = NaiveDate::from_ymd_opt(1990, 11, 2);
        assert_eq!(select_trigger(&lifecycle, false, now), None);
    }

    #[test]
    fn test_launch_requires_flag_and_no_prior_launch_coupon() {
        let now = now();
        let mut lifecycle = base_lifecycle(now);

        assert_eq!(select_trigger(&lifecycle, false, now), None);
        assert_eq!(
            select_trigger(&lifecycle, true, now),
            Some(CouponTemplateKey::Launch)
        );

        lifecycle.held_templates.insert(CouponTemplateKey::Launch);
        assert_eq!(select_trigger(&lifecycle, true, now), None);
    }

    #[test]
    fn test_discount_and_minimum_text() {
        let catalog = TemplateCatalog::standard();

        let welcome = catalog.get(CouponTemplateKey::Welcome).unwrap();
        assert_eq!(discount_text(welcome), "10% off");
        assert_eq!(minimum_text(welcome), "Valid on orders of 2000 or more.");

        let first = catalog.get(CouponTemplateKey::FirstOrder).unwrap();
        assert_eq!(discount_text(first), "1000 off");

        let birthday = catalog.get(CouponTemplateKey::Birthday).unwrap();
        assert_eq!(minimum_text(birthday), "No minimum purchase required.");
    }
}
