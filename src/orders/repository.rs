use sqlx::PgPool;
use uuid::Uuid;

use crate::orders::error::OrderError;
use crate::orders::{Order, OrderItem, OrderStatus};

/// Repository for order operations
///
/// Orders are created by the checkout subsystem; this service only reads
/// them and advances their status. The points_awarded flag is flipped by
/// the ledger inside the award transaction, not here.
#[derive(Clone)]
pub struct OrdersRepository {
    pool: PgPool,
}

impl OrdersRepository {
    /// Create a new OrdersRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find an order by ID
    pub async fn find_by_id(&self, order_id: Uuid) -> Result<Option<Order>, OrderError> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, user_id, status, total_price, points_awarded, created_at, updated_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Find orders by user ID with optional status filter
    pub async fn find_by_user_id(
        &self,
        user_id: i32,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, OrderError> {
        let orders = match status {
            Some(status_filter) => {
                sqlx::query_as::<_, Order>(
                    r#"
                    SELECT id, user_id, status, total_price, points_awarded, created_at, updated_at
                    FROM orders
                    WHERE user_id = $1 AND status = $2
                    ORDER BY created_at DESC
                    "#,
                )
                .bind(user_id)
                .bind(status_filter)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Order>(
                    r#"
                    SELECT id, user_id, status, total_price, points_awarded, created_at, updated_at
                    FROM orders
                    WHERE user_id = $1
                    ORDER BY created_at DESC
                    "#,
                )
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(orders)
    }

    /// Update order status
    pub async fn update_status(
        &self,
        order_id: Uuid,
        new_status: OrderStatus,
    ) -> Result<Order, OrderError> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders
            SET status = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING id, user_id, status, total_price, points_awarded, created_at, updated_at
            "#,
        )
        .bind(new_status)
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(OrderError::NotFound)?;

        Ok(order)
    }
}

/// Repository for order items operations
#[derive(Clone)]
pub struct OrderItemsRepository {
    pool: PgPool,
}

impl OrderItemsRepository {
    /// Create a new OrderItemsRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find all items for a given order
    pub async fn find_by_order_id(&self, order_id: Uuid) -> Result<Vec<OrderItem>, OrderError> {
        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT id, order_id, product_name, unit_price, quantity, on_sale, campaign_id
            FROM order_items
            WHERE order_id = $1
            ORDER BY id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    // Repository methods are exercised through the database-gated
    // integration tests in src/tests.rs.
}
