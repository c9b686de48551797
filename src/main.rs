mod auth;
mod checkout;
mod db;
mod error;
mod loyalty;
mod models;
mod notifications;
mod orders;
mod validation;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use loyalty::{LoyaltyEngine, LoyaltySettings};
use notifications::NotificationsRepository;
use orders::{OrderItemsRepository, OrderService, OrdersRepository};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        checkout::handlers::validate_coupon_handler,
        checkout::handlers::apply_points_handler,
        orders::handlers::complete_order_handler,
        loyalty::handlers::evaluate_coupons_handler,
        loyalty::handlers::get_balance_handler,
    ),
    components(
        schemas(
            checkout::models::ValidateCouponRequest,
            checkout::models::ValidateCouponResponse,
            checkout::models::ApplyPointsRequest,
            checkout::models::ApplyPointsResponse,
            orders::models::CompleteOrderRequest,
            orders::models::CompleteOrderResponse,
            orders::models::CancelOrderRequest,
            orders::models::CancelOrderResponse,
            orders::models::OrderResponse,
            orders::models::OrderItemResponse,
            orders::models::OrderStatus,
            orders::models::PointsAwardResponse,
            loyalty::handlers::EvaluateCouponsResponse,
            loyalty::handlers::BalanceResponse,
            loyalty::issuer::Coupon,
            loyalty::ledger::PointEntry,
            loyalty::types::DiscountType,
            loyalty::types::CouponTemplateKey,
            notifications::models::Notification,
            notifications::models::NotificationKind,
            models::User,
        )
    ),
    tags(
        (name = "checkout", description = "Checkout-time coupon and points validation"),
        (name = "orders", description = "Order completion and cancellation"),
        (name = "coupons", description = "Coupon issuance and listing"),
        (name = "loyalty", description = "Points balance, history and metrics")
    ),
    info(
        title = "Loyalty API",
        version = "1.0.0",
        description = "Loyalty accrual and redemption service: points ledger, coupon issuance and checkout validation",
        contact(
            name = "API Support",
            email = "support@loyaltyapi.dev"
        )
    )
)]
struct ApiDoc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub order_service: OrderService,
    pub loyalty: Arc<LoyaltyEngine>,
    pub notifications: NotificationsRepository,
}

/// Creates and configures the application router
/// Maps all API endpoints to their handlers and adds CORS middleware;
/// checkout routes additionally sit behind a rate limiter
fn create_router(db: PgPool) -> Router {
    use tower_http::cors::{Any, CorsLayer};

    let settings = LoyaltySettings::from_env();
    let loyalty_engine = Arc::new(LoyaltyEngine::new(db.clone(), settings));

    let order_service = OrderService::new(
        OrdersRepository::new(db.clone()),
        OrderItemsRepository::new(db.clone()),
        loyalty_engine.clone(),
    );

    let state = AppState {
        notifications: NotificationsRepository::new(db.clone()),
        order_service,
        loyalty: loyalty_engine,
        db,
    };

    // Configure CORS to allow all origins, methods, and headers
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Rate limit the checkout validation endpoints
    let governor_conf = Box::new(
        GovernorConfigBuilder::default()
            .per_second(2)
            .burst_size(10)
            .finish()
            .expect("valid rate limiter configuration"),
    );

    let checkout_routes = Router::new()
        .route(
            "/api/checkout/validate-coupon",
            post(checkout::handlers::validate_coupon_handler),
        )
        .route(
            "/api/checkout/apply-points",
            post(checkout::handlers::apply_points_handler),
        )
        .layer(GovernorLayer {
            config: Box::leak(governor_conf),
        });

    Router::new()
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Checkout validation (rate limited)
        .merge(checkout_routes)
        // Order transitions
        .route("/api/orders/:order_id", get(orders::handlers::get_order_handler))
        .route(
            "/api/orders/:order_id/complete",
            post(orders::handlers::complete_order_handler),
        )
        .route(
            "/api/orders/:order_id/cancel",
            post(orders::handlers::cancel_order_handler),
        )
        // Coupons
        .route("/api/coupons", get(loyalty::handlers::list_coupons_handler))
        .route(
            "/api/coupons/evaluate",
            post(loyalty::handlers::evaluate_coupons_handler),
        )
        // Points
        .route("/api/loyalty/balance", get(loyalty::handlers::get_balance_handler))
        .route("/api/loyalty/history", get(loyalty::handlers::get_history_handler))
        .route("/api/loyalty/metrics", get(loyalty::handlers::get_metrics_handler))
        // Notifications
        .route(
            "/api/notifications",
            get(notifications::handlers::list_notifications_handler),
        )
        .route(
            "/api/notifications/:id/read",
            post(notifications::handlers::mark_notification_read_handler),
        )
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Loyalty API - Starting...");

    // Get configuration from environment variables
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set in environment");
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = db::create_pool(&database_url)
        .await
        .expect("Failed to create database pool");

    // Run SQLx migrations on startup
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations completed successfully");

    // Create the application router
    let app = create_router(db_pool);

    // Start the Axum server
    let addr = format!("{}:{}", host, port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Loyalty API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    // ConnectInfo is required by the rate limiter's peer-IP key extractor
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Server error");
}

#[cfg(test)]
mod tests;
