use std::sync::Arc;
use uuid::Uuid;

use crate::loyalty::{
    AwardOutcome, CouponRedemption, LoyaltyEngine, LoyaltyError, PointItem,
};
use crate::orders::{
    CancelOrderResponse, CompleteOrderRequest, CompleteOrderResponse, OrderError, OrderItem,
    OrderItemsRepository, OrderResponse, OrderStatus, OrdersRepository, PointsAwardResponse,
    StatusMachine,
};

/// Service for order completion and cancellation
///
/// Orders themselves are created and paid for by the checkout subsystem;
/// this service owns the loyalty side effects of the final transitions.
#[derive(Clone)]
pub struct OrderService {
    orders_repo: OrdersRepository,
    order_items_repo: OrderItemsRepository,
    loyalty: Arc<LoyaltyEngine>,
}

impl OrderService {
    /// Create a new OrderService
    pub fn new(
        orders_repo: OrdersRepository,
        order_items_repo: OrderItemsRepository,
        loyalty: Arc<LoyaltyEngine>,
    ) -> Self {
        Self {
            orders_repo,
            order_items_repo,
            loyalty,
        }
    }

    /// Complete an order
    ///
    /// # Flow
    /// 1. Verify ownership and that the transition to Completed is valid
    /// 2. Redeem an applied coupon and/or points (each atomic; rejections
    ///    are returned as `success: false`, not errors)
    /// 3. Persist the status transition
    /// 4. Award loyalty points and run coupon trigger evaluation; failures
    ///    here are logged and degrade silently so a completed order is
    ///    never rolled back over loyalty bookkeeping
    pub async fn complete_order(
        &self,
        order_id: Uuid,
        user_id: i32,
        request: CompleteOrderRequest,
    ) -> Result<CompleteOrderResponse, OrderError> {
        let order = self
            .orders_repo
            .find_by_id(order_id)
            .await?
            .ok_or(OrderError::NotFound)?;

        if order.user_id != user_id {
            return Err(OrderError::Forbidden(
                "You do not have permission to access this order".to_string(),
            ));
        }

        // Validate the transition before consuming any coupon or points
        StatusMachine::transition(order.status, OrderStatus::Completed)
            .map_err(OrderError::InvalidTransition)?;

        if let Some(ref code) = request.coupon_code {
            match self
                .loyalty
                .redeem_coupon(code, user_id, order.total_price)
                .await?
            {
                CouponRedemption::Redeemed { .. } => {
                    tracing::info!("Coupon {} applied to order {}", code, order_id);
                }
                CouponRedemption::Rejected { message } => {
                    return Ok(CompleteOrderResponse {
                        success: false,
                        message: Some(message),
                        order: None,
                        points: None,
                        coupon: None,
                    });
                }
            }
        }

        if let Some(points_to_use) = request.points_to_use {
            match self.loyalty.redeem_points(user_id, points_to_use, order_id).await {
                Ok(_) => {
                    tracing::info!("{} points applied to order {}", points_to_use, order_id);
                }
                Err(LoyaltyError::InsufficientPoints { available, .. }) => {
                    return Ok(CompleteOrderResponse {
                        success: false,
                        message: Some(format!("Only {} points are available", available)),
                        order: None,
                        points: None,
                        coupon: None,
                    });
                }
                Err(e) => return Err(e.into()),
            }
        }

        self.orders_repo
            .update_status(order_id, OrderStatus::Completed)
            .await?;

        // Award points; failures must not block order completion
        let items = self.order_items_repo.find_by_order_id(order_id).await?;
        let point_items: Vec<PointItem> = items.iter().map(to_point_item).collect();

        let points = match self
            .loyalty
            .award_order_points(order_id, user_id, &point_items)
            .await
        {
            Ok(AwardOutcome::Awarded { entry, calculation }) => {
                tracing::info!(
                    "Awarded {} points to user {} for order {}",
                    calculation.total_points,
                    user_id,
                    order_id
                );
                Some(PointsAwardResponse {
                    base_points: calculation.base_points,
                    bonus_points: calculation.bonus_points,
                    total_points: calculation.total_points,
                    expires_at: entry.expires_at,
                })
            }
            Ok(AwardOutcome::AlreadyAwarded) => {
                tracing::debug!("Points already awarded for order {}", order_id);
                None
            }
            Err(e) => {
                tracing::warn!("Failed to award loyalty points for order {}: {}", order_id, e);
                None
            }
        };

        // Run coupon trigger evaluation; same silent degradation
        let coupon = match self.loyalty.evaluate_coupons(user_id).await {
            Ok(outcome) => outcome.coupon,
            Err(e) => {
                tracing::warn!(
                    "Coupon trigger evaluation failed after order {}: {}",
                    order_id,
                    e
                );
                None
            }
        };

        let order = self
            .orders_repo
            .find_by_id(order_id)
            .await?
            .ok_or(OrderError::NotFound)?;

        Ok(CompleteOrderResponse {
            success: true,
            message: None,
            order: Some(OrderResponse::from_order(order, items)),
            points,
            coupon,
        })
    }

    /// Cancel an order and reverse its loyalty points
    pub async fn cancel_order(
        &self,
        order_id: Uuid,
        user_id: i32,
        reason: Option<String>,
    ) -> Result<CancelOrderResponse, OrderError> {
        let order = self
            .orders_repo
            .find_by_id(order_id)
            .await?
            .ok_or(OrderError::NotFound)?;

        if order.user_id != user_id {
            return Err(OrderError::Forbidden(
                "You do not have permission to access this order".to_string(),
            ));
        }

        StatusMachine::transition(order.status, OrderStatus::Cancelled)
            .map_err(OrderError::InvalidTransition)?;

        let order = self
            .orders_repo
            .update_status(order_id, OrderStatus::Cancelled)
            .await?;

        let reason = reason.unwrap_or_else(|| "Order cancelled".to_string());
        let outcome = self
            .loyalty
            .reverse_order_points(order_id, user_id, &reason)
            .await?;

        let points_reversed: i32 = -outcome.reversed_entries.iter().map(|e| e.amount).sum::<i32>();

        let items = self.order_items_repo.find_by_order_id(order_id).await?;

        Ok(CancelOrderResponse {
            success: true,
            order: OrderResponse::from_order(order, items),
            points_reversed,
            message: outcome.message,
        })
    }

    /// Get an order with its items, verifying ownership
    pub async fn get_order(
        &self,
        order_id: Uuid,
        user_id: i32,
    ) -> Result<OrderResponse, OrderError> {
        let order = self
            .orders_repo
            .find_by_id(order_id)
            .await?
            .ok_or(OrderError::NotFound)?;

        if order.user_id != user_id {
            return Err(OrderError::Forbidden(
                "You do not have permission to access this order".to_string(),
            ));
        }

        let items = self.order_items_repo.find_by_order_id(order_id).await?;
        Ok(OrderResponse::from_order(order, items))
    }
}

fn to_point_item(item: &OrderItem) -> PointItem {
    PointItem {
        product_name: item.product_name.clone(),
        unit_price: item.unit_price,
        quantity: item.quantity,
        on_sale: item.on_sale,
        campaign_id: item.campaign_id,
    }
}
