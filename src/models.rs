// Shared domain models
//
// The user account itself is owned by the storefront; only the fields the
// loyalty rules consume are read here.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// A storefront user as seen by the loyalty system
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub name: String,
    /// Used by the birthday coupon trigger; optional
    pub birthdate: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}
