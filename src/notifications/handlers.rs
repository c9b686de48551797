// HTTP handlers for the notifications inbox

use axum::{
    extract::{Path, State},
    Json,
};

use crate::auth::middleware::AuthenticatedUser;
use crate::error::ApiError;
use crate::notifications::models::Notification;

/// Handler for GET /api/notifications
/// Lists the authenticated user's notifications, newest first
pub async fn list_notifications_handler(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<Notification>>, ApiError> {
    let notifications = state
        .notifications
        .list_for_user(user.user_id)
        .await
        .map_err(ApiError::DatabaseError)?;

    Ok(Json(notifications))
}

/// Handler for POST /api/notifications/{id}/read
/// Marks one of the user's notifications as read
pub async fn mark_notification_read_handler(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Path(notification_id): Path<i32>,
) -> Result<Json<Notification>, ApiError> {
    let notification = state
        .notifications
        .mark_read(notification_id, user.user_id)
        .await
        .map_err(ApiError::DatabaseError)?
        .ok_or_else(|| ApiError::NotFound {
            resource: "Notification".to_string(),
            id: notification_id.to_string(),
        })?;

    Ok(Json(notification))
}
