// Orders module
//
// Reads orders owned by the checkout subsystem and drives the two
// transitions with loyalty side effects: completion and cancellation.

pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod status_machine;

pub use error::OrderError;
pub use models::{
    CancelOrderRequest, CancelOrderResponse, CompleteOrderRequest, CompleteOrderResponse, Order,
    OrderItem, OrderItemResponse, OrderResponse, OrderStatus, PointsAwardResponse,
};
pub use repository::{OrderItemsRepository, OrdersRepository};
pub use service::OrderService;
pub use status_machine::StatusMachine;
