// HTTP handlers for order endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthenticatedUser;
use crate::orders::{
    CancelOrderRequest, CancelOrderResponse, CompleteOrderRequest, CompleteOrderResponse,
    OrderError, OrderResponse,
};

/// Handler for POST /api/orders/{order_id}/complete
/// Completes an order: redeems an applied coupon/points, awards loyalty
/// points and runs coupon trigger evaluation
#[utoipa::path(
    post,
    path = "/api/orders/{order_id}/complete",
    params(
        ("order_id" = Uuid, Path, description = "Order ID")
    ),
    request_body = CompleteOrderRequest,
    responses(
        (status = 200, description = "Completion outcome", body = CompleteOrderResponse),
        (status = 400, description = "Invalid status transition"),
        (status = 403, description = "Order belongs to another user"),
        (status = 404, description = "Order not found")
    ),
    tag = "orders"
)]
pub async fn complete_order_handler(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Path(order_id): Path<Uuid>,
    Json(request): Json<CompleteOrderRequest>,
) -> Result<Json<CompleteOrderResponse>, OrderError> {
    request
        .validate()
        .map_err(|e| OrderError::ValidationError(e.to_string()))?;

    let response = state
        .order_service
        .complete_order(order_id, user.user_id, request)
        .await?;

    Ok(Json(response))
}

/// Handler for POST /api/orders/{order_id}/cancel
/// Cancels an order and reverses its awarded points
pub async fn cancel_order_handler(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Path(order_id): Path<Uuid>,
    Json(request): Json<CancelOrderRequest>,
) -> Result<Json<CancelOrderResponse>, OrderError> {
    request
        .validate()
        .map_err(|e| OrderError::ValidationError(e.to_string()))?;

    let response = state
        .order_service
        .cancel_order(order_id, user.user_id, request.reason)
        .await?;

    Ok(Json(response))
}

/// Handler for GET /api/orders/{order_id}
/// Retrieves a specific order by ID
pub async fn get_order_handler(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderResponse>, OrderError> {
    let order = state
        .order_service
        .get_order(order_id, user.user_id)
        .await?;

    Ok(Json(order))
}
