// HTTP handlers for loyalty endpoints (coupons, balance, history, metrics)

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::middleware::AuthenticatedUser;
use crate::loyalty::issuer::Coupon;
use crate::loyalty::ledger::PointEntry;
use crate::loyalty::LoyaltyError;

/// Response DTO for a coupon trigger evaluation pass
#[derive(Debug, Serialize, ToSchema)]
pub struct EvaluateCouponsResponse {
    pub success: bool,
    pub coupon_issued: bool,
    pub coupon: Option<Coupon>,
}

/// Response DTO for the points balance
#[derive(Debug, Serialize, ToSchema)]
pub struct BalanceResponse {
    pub balance: i64,
}

/// Handler for POST /api/coupons/evaluate
/// Runs lifecycle trigger evaluation for the authenticated user and issues
/// at most one coupon
#[utoipa::path(
    post,
    path = "/api/coupons/evaluate",
    responses(
        (status = 200, description = "Evaluation completed", body = EvaluateCouponsResponse),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "coupons"
)]
pub async fn evaluate_coupons_handler(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
) -> Result<Json<EvaluateCouponsResponse>, LoyaltyError> {
    tracing::debug!("Evaluating coupon triggers for user {}", user.user_id);

    let outcome = state.loyalty.evaluate_coupons(user.user_id).await?;

    Ok(Json(EvaluateCouponsResponse {
        success: true,
        coupon_issued: outcome.coupon_issued,
        coupon: outcome.coupon,
    }))
}

/// Handler for GET /api/coupons
/// Lists the authenticated user's coupons
pub async fn list_coupons_handler(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<Coupon>>, LoyaltyError> {
    let coupons = state.loyalty.list_coupons(user.user_id).await?;
    Ok(Json(coupons))
}

/// Handler for GET /api/loyalty/balance
/// Returns the sum of the user's non-expired point entries
#[utoipa::path(
    get,
    path = "/api/loyalty/balance",
    responses(
        (status = 200, description = "Current balance", body = BalanceResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "loyalty"
)]
pub async fn get_balance_handler(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
) -> Result<Json<BalanceResponse>, LoyaltyError> {
    let balance = state.loyalty.balance(user.user_id).await?;
    Ok(Json(BalanceResponse { balance }))
}

/// Handler for GET /api/loyalty/history
/// Returns the user's full point ledger, newest first
pub async fn get_history_handler(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<PointEntry>>, LoyaltyError> {
    let entries = state.loyalty.history(user.user_id).await?;
    Ok(Json(entries))
}

/// Handler for GET /api/loyalty/metrics
/// Returns performance metrics for the loyalty system
pub async fn get_metrics_handler(
    State(state): State<crate::AppState>,
) -> Json<serde_json::Value> {
    let summary = state.loyalty.metrics().summary();

    Json(serde_json::json!({
        "calculations": {
            "count": summary.points_calculations,
            "avg_time_ms": format!("{:.2}", summary.avg_calculation_time_ms),
            "slow_operations": summary.slow_calculations,
        },
        "ledger": {
            "writes": summary.ledger_writes,
            "avg_time_ms": format!("{:.2}", summary.avg_ledger_time_ms),
            "slow_operations": summary.slow_ledger_writes,
        },
        "issuance": {
            "passes": summary.coupon_issuances,
            "avg_time_ms": format!("{:.2}", summary.avg_issuance_time_ms),
            "slow_operations": summary.slow_issuances,
        },
        "validation": {
            "checks": summary.checkout_validations,
            "avg_time_ms": format!("{:.2}", summary.avg_validation_time_ms),
            "slow_operations": summary.slow_validations,
        },
    }))
}
