use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::loyalty::issuer::Coupon;

/// Order status enum representing the lifecycle of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Convert status to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Parse status from string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "paid" => Ok(OrderStatus::Paid),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err(format!("Invalid order status: {}", s)),
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Domain model representing an order in the database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: Uuid,
    pub user_id: i32,
    pub status: OrderStatus,
    pub total_price: Decimal,
    pub points_awarded: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Domain model representing an item within an order
///
/// Carries the product flags the points calculator consumes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderItem {
    pub id: i32,
    pub order_id: Uuid,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub on_sale: bool,
    pub campaign_id: Option<Uuid>,
}

/// Request DTO for completing an order
///
/// An applied coupon or points amount is redeemed atomically as part of
/// completion.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CompleteOrderRequest {
    #[validate(custom = "crate::validation::validate_coupon_code_format")]
    pub coupon_code: Option<String>,

    #[validate(range(min = 1, message = "Points must be positive"))]
    pub points_to_use: Option<i32>,
}

/// Request DTO for cancelling an order
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CancelOrderRequest {
    #[validate(length(max = 200, message = "Reason must be at most 200 characters"))]
    pub reason: Option<String>,
}

/// Response DTO for order with items
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub user_id: i32,
    pub status: OrderStatus,
    pub total_price: Decimal,
    pub points_awarded: bool,
    pub items: Vec<OrderItemResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Response DTO for order item
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: i32,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub on_sale: bool,
    pub campaign_id: Option<Uuid>,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        Self {
            id: item.id,
            product_name: item.product_name,
            unit_price: item.unit_price,
            quantity: item.quantity,
            on_sale: item.on_sale,
            campaign_id: item.campaign_id,
        }
    }
}

impl OrderResponse {
    pub fn from_order(order: Order, items: Vec<OrderItem>) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            status: order.status,
            total_price: order.total_price,
            points_awarded: order.points_awarded,
            items: items.into_iter().map(|item| item.into()).collect(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

/// Summary of the points awarded during completion
#[derive(Debug, Serialize, ToSchema)]
pub struct PointsAwardResponse {
    pub base_points: i32,
    pub bonus_points: i32,
    pub total_points: i32,
    pub expires_at: DateTime<Utc>,
}

/// Response DTO for order completion
///
/// Business-rule rejections (bad coupon, insufficient points) come back as
/// `success: false` with a message, not as an error status.
#[derive(Debug, Serialize, ToSchema)]
pub struct CompleteOrderResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub order: Option<OrderResponse>,
    pub points: Option<PointsAwardResponse>,
    pub coupon: Option<Coupon>,
}

/// Response DTO for order cancellation
#[derive(Debug, Serialize, ToSchema)]
pub struct CancelOrderResponse {
    pub success: bool,
    pub order: OrderResponse,
    pub points_reversed: i32,
    pub message: String,
}
