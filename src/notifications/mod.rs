// Notifications module
//
// User-facing notification rows plus the rendered email outbox. Loyalty
// flows write here; failures on these side channels never unwind the
// primary operation.

pub mod email;
pub mod handlers;
pub mod models;
pub mod repository;

pub use models::{Notification, NotificationKind};
pub use repository::NotificationsRepository;
