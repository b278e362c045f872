use sqlx::PgPool;

use crate::error::AppError;
use crate::models::{User, UserInput};

const USER_COLUMNS: &str =
    "id, username, email, password_hash, avatar, refresh_token, confirmed, created_at";

/// Looks up a user by email address.
pub async fn get_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE email = $1",
        USER_COLUMNS
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Inserts a new, unconfirmed user.
///
/// The caller is responsible for hashing the password. A duplicate email surfaces as
/// `AppError::Conflict`.
pub async fn create_user(
    pool: &PgPool,
    input: &UserInput,
    password_hash: &str,
    avatar: Option<&str>,
) -> Result<User, AppError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (username, email, password_hash, avatar)
         VALUES ($1, $2, $3, $4)
         RETURNING {}",
        USER_COLUMNS
    ))
    .bind(&input.username)
    .bind(&input.email)
    .bind(password_hash)
    .bind(avatar)
    .fetch_one(pool)
    .await?;

    Ok(user)
}

/// Stores the latest refresh token for a user, or clears it with `None`.
pub async fn update_token(
    pool: &PgPool,
    user_id: i32,
    token: Option<&str>,
) -> Result<(), AppError> {
    sqlx::query("UPDATE users SET refresh_token = $1 WHERE id = $2")
        .bind(token)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Marks the user's email address as confirmed.
pub async fn confirmed_email(pool: &PgPool, email: &str) -> Result<(), AppError> {
    let result = sqlx::query("UPDATE users SET confirmed = TRUE WHERE email = $1")
        .bind(email)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".into()));
    }

    Ok(())
}

pub async fn update_avatar(pool: &PgPool, email: &str, url: &str) -> Result<User, AppError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET avatar = $1 WHERE email = $2 RETURNING {}",
        USER_COLUMNS
    ))
    .bind(url)
    .bind(email)
    .fetch_one(pool)
    .await?;

    Ok(user)
}
