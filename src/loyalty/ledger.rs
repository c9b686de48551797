// Points Ledger Writer
//
// Append-only signed point entries. Awards and cancellations never mutate
// existing rows; a cancellation writes negated counterparts. The award path
// flips the order's points_awarded flag in the same transaction so a crash
// cannot award points without marking the order (or the reverse).

use crate::loyalty::calculator::PointsCalculation;
use crate::loyalty::error::{LoyaltyError, LoyaltyResult};
use crate::notifications::{NotificationKind, NotificationsRepository};
use chrono::{DateTime, Months, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use utoipa::ToSchema;
use uuid::Uuid;

/// A signed ledger row representing an award, cancellation or redemption
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct PointEntry {
    pub id: i32,
    pub user_id: i32,
    pub amount: i32,
    pub order_id: Option<Uuid>,
    pub reason: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Result of an award attempt
#[derive(Debug)]
pub enum AwardOutcome {
    /// Points were written and the order flagged
    Awarded {
        entry: PointEntry,
        calculation: PointsCalculation,
    },

    /// The order was already flagged; nothing was written
    AlreadyAwarded,
}

/// Result of a cancellation
#[derive(Debug)]
pub struct CancelOutcome {
    pub reversed_entries: Vec<PointEntry>,
    pub message: String,
}

/// Points Ledger Writer
///
/// All multi-row writes run inside a single transaction. Notifications are
/// written after commit and degrade silently on failure.
#[derive(Clone)]
pub struct PointsLedger {
    pool: PgPool,
    notifications: NotificationsRepository,
}

impl PointsLedger {
    pub fn new(pool: PgPool, notifications: NotificationsRepository) -> Self {
        Self {
            pool,
            notifications,
        }
    }

    /// Award calculated points for a completed order
    ///
    /// Inside one transaction: locks the order row, re-checks the
    /// points_awarded flag (second calls are no-ops), inserts the positive
    /// ledger entry with a one-year expiry from now, and flips the flag.
    pub async fn award(
        &self,
        order_id: Uuid,
        user_id: i32,
        calculation: PointsCalculation,
    ) -> LoyaltyResult<AwardOutcome> {
        let mut tx = self.pool.begin().await?;

        let already_awarded: Option<bool> =
            sqlx::query_scalar("SELECT points_awarded FROM orders WHERE id = $1 FOR UPDATE")
                .bind(order_id)
                .fetch_optional(&mut *tx)
                .await?;

        let already_awarded = already_awarded.ok_or(LoyaltyError::OrderNotFound(order_id))?;
        if already_awarded {
            tracing::debug!("Order {} already has points awarded, skipping", order_id);
            return Ok(AwardOutcome::AlreadyAwarded);
        }

        // Expiry counts from the awarding call, not from the order date
        let expires_at = Utc::now() + Months::new(12);
        let reason = format!(
            "Order points ({} base + {} bonus)",
            calculation.base_points, calculation.bonus_points
        );

        let entry = sqlx::query_as::<_, PointEntry>(
            r#"
            INSERT INTO point_entries (user_id, amount, order_id, reason, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, amount, order_id, reason, expires_at, created_at
            "#,
        )
        .bind(user_id)
        .bind(calculation.total_points)
        .bind(order_id)
        .bind(&reason)
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE orders SET points_awarded = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            "Awarded {} points to user {} for order {}",
            calculation.total_points,
            user_id,
            order_id
        );

        // Notification failure must not unwind a committed award
        if let Err(e) = self
            .notifications
            .insert(
                user_id,
                NotificationKind::PointsAwarded,
                "Loyalty points earned",
                &format!(
                    "You earned {} points on your order. They expire on {}.",
                    calculation.total_points,
                    entry.expires_at.format("%B %e, %Y")
                ),
            )
            .await
        {
            tracing::warn!("Failed to write points-awarded notification: {}", e);
        }

        Ok(AwardOutcome::Awarded { entry, calculation })
    }

    /// Reverse all positive entries tied to an order
    ///
    /// For each positive entry a negated counterpart is inserted with the
    /// same expiry, all in one transaction. An order with no positive
    /// entries is a success no-op. Nothing prevents the user's net balance
    /// from going negative here.
    pub async fn cancel(
        &self,
        order_id: Uuid,
        user_id: i32,
        reason: &str,
    ) -> LoyaltyResult<CancelOutcome> {
        let mut tx = self.pool.begin().await?;

        let positives = sqlx::query_as::<_, PointEntry>(
            r#"
            SELECT id, user_id, amount, order_id, reason, expires_at, created_at
            FROM point_entries
            WHERE order_id = $1 AND amount > 0
            ORDER BY id
            "#,
        )
        .bind(order_id)
        .fetch_all(&mut *tx)
        .await?;

        if positives.is_empty() {
            tracing::debug!("No positive point entries for order {}, nothing to reverse", order_id);
            return Ok(CancelOutcome {
                reversed_entries: Vec::new(),
                message: "No points were awarded for this order; nothing to reverse".to_string(),
            });
        }

        let mut reversed_entries = Vec::with_capacity(positives.len());
        for original in &positives {
            let entry = sqlx::query_as::<_, PointEntry>(
                r#"
                INSERT INTO point_entries (user_id, amount, order_id, reason, expires_at)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, user_id, amount, order_id, reason, expires_at, created_at
                "#,
            )
            .bind(original.user_id)
            .bind(-original.amount)
            .bind(order_id)
            .bind(reason)
            .bind(original.expires_at)
            .fetch_one(&mut *tx)
            .await?;

            reversed_entries.push(entry);
        }

        tx.commit().await?;

        let total_reversed: i32 = reversed_entries.iter().map(|e| e.amount).sum();
        tracing::info!(
            "Reversed {} points across {} entries for order {}",
            total_reversed,
            reversed_entries.len(),
            order_id
        );

        if let Err(e) = self
            .notifications
            .insert(
                user_id,
                NotificationKind::PointsCancelled,
                "Loyalty points reversed",
                &format!(
                    "{} points were reversed for a cancelled order: {}",
                    -total_reversed, reason
                ),
            )
            .await
        {
            tracing::warn!("Failed to write points-cancelled notification: {}", e);
        }

        Ok(CancelOutcome {
            message: format!("Reversed {} point entries", reversed_entries.len()),
            reversed_entries,
        })
    }

    /// Sum of the user's non-expired entries
    pub async fn balance(&self, user_id: i32) -> LoyaltyResult<i64> {
        let balance: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(amount), 0)
            FROM point_entries
            WHERE user_id = $1 AND expires_at > NOW()
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(balance)
    }

    /// Full ledger history for a user, most recent first
    pub async fn history(&self, user_id: i32) -> LoyaltyResult<Vec<PointEntry>> {
        let entries = sqlx::query_as::<_, PointEntry>(
            r#"
            SELECT id, user_id, amount, order_id, reason, expires_at, created_at
            FROM point_entries
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Consume points at order finalization
    ///
    /// Takes a per-user advisory lock for the duration of the transaction,
    /// recomputes the non-expired balance under that lock and inserts the
    /// negative redemption entry only if the balance still covers the
    /// amount. Concurrent validate-then-consume sequences for the same user
    /// serialize on the lock.
    pub async fn redeem(
        &self,
        user_id: i32,
        amount: i32,
        order_id: Uuid,
    ) -> LoyaltyResult<PointEntry> {
        if amount <= 0 {
            return Err(LoyaltyError::CalculationError(format!(
                "Redeem amount must be positive, got {}",
                amount
            )));
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(i64::from(user_id))
            .execute(&mut *tx)
            .await?;

        let available: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(amount), 0)
            FROM point_entries
            WHERE user_id = $1 AND expires_at > NOW()
            "#,
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        if available < i64::from(amount) {
            return Err(LoyaltyError::InsufficientPoints {
                requested: amount,
                available,
            });
        }

        let entry = sqlx::query_as::<_, PointEntry>(
            r#"
            INSERT INTO point_entries (user_id, amount, order_id, reason, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, amount, order_id, reason, expires_at, created_at
            "#,
        )
        .bind(user_id)
        .bind(-amount)
        .bind(order_id)
        .bind("Points redeemed at checkout")
        .bind(Utc::now() + Months::new(12))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            "Redeemed {} points from user {} for order {}",
            amount,
            user_id,
            order_id
        );

        if let Err(e) = self
            .notifications
            .insert(
                user_id,
                NotificationKind::PointsRedeemed,
                "Loyalty points redeemed",
                &format!("{} points were applied to your order.", amount),
            )
            .await
        {
            tracing::warn!("Failed to write points-redeemed notification: {}", e);
        }

        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Repository paths are covered by the database-gated integration tests
    // in src/tests.rs. The units here pin the outcome shapes.

    #[test]
    fn test_cancel_outcome_noop_message() {
        let outcome = CancelOutcome {
            reversed_entries: Vec::new(),
            message: "No points were awarded for this order; nothing to reverse".to_string(),
        };

        assert!(outcome.reversed_entries.is_empty());
        assert!(outcome.message.contains("nothing to reverse"));
    }

    #[test]
    fn test_point_entry_serializes() {
        let entry = PointEntry {
            id: 1,
            user_id: 7,
            amount: -20,
            order_id: Some(Uuid::new_v4()),
            reason: "Order cancelled".to_string(),
            expires_at: Utc::now(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["amount"], -20);
        assert_eq!(json["user_id"], 7);
    }
}
