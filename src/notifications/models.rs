use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use utoipa::ToSchema;

/// Category of a user notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    PointsAwarded,
    PointsCancelled,
    PointsRedeemed,
    CouponIssued,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::PointsAwarded => write!(f, "points_awarded"),
            NotificationKind::PointsCancelled => write!(f, "points_cancelled"),
            NotificationKind::PointsRedeemed => write!(f, "points_redeemed"),
            NotificationKind::CouponIssued => write!(f, "coupon_issued"),
        }
    }
}

/// A notification row shown in the user's inbox
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Notification {
    pub id: i32,
    pub user_id: i32,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_display() {
        assert_eq!(NotificationKind::PointsAwarded.to_string(), "points_awarded");
        assert_eq!(NotificationKind::CouponIssued.to_string(), "coupon_issued");
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&NotificationKind::PointsRedeemed).unwrap();
        assert_eq!(json, "\"points_redeemed\"");
    }
}
