use crate::models::User;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Type alias for the PostgreSQL connection pool
pub type DbPool = PgPool;

/// Creates and configures a PostgreSQL connection pool
///
/// # Arguments
/// * `database_url` - PostgreSQL connection string
///
/// # Returns
/// * `Result<DbPool>` - Configured connection pool or error
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    tracing::debug!("Creating database connection pool");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(3))
        .connect(database_url)
        .await?;

    tracing::info!("Database connection pool created successfully");
    Ok(pool)
}

/// Look up a user by ID
///
/// # Arguments
/// * `pool` - Database connection pool
/// * `user_id` - ID of the user
///
/// # Returns
/// * `Result<Option<User>, sqlx::Error>` - The user row, if it exists
pub async fn find_user(pool: &PgPool, user_id: i32) -> Result<Option<User>, sqlx::Error> {
    tracing::debug!("Looking up user {}", user_id);

    sqlx::query_as::<_, User>(
        "SELECT id, email, name, birthdate, created_at FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Check whether a user exists
///
/// # Arguments
/// * `pool` - Database connection pool
/// * `user_id` - ID of the user
///
/// # Returns
/// * `Result<bool, sqlx::Error>` - True if the user row exists
pub async fn user_exists(pool: &PgPool, user_id: i32) -> Result<bool, sqlx::Error> {
    let exists: Option<bool> = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    Ok(exists.unwrap_or(false))
}
