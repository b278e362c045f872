use crate::{
    error::AppError,
    models::{AvatarInput, UserResponse},
    repository::users as repository_users,
    services::auth::CurrentUser,
};
use actix_web::{get, patch, web, HttpResponse, Responder};
use sqlx::PgPool;
use validator::Validate;

/// Profile of the authenticated user.
#[get("/me")]
pub async fn read_users_me(user: CurrentUser) -> Result<impl Responder, AppError> {
    Ok(HttpResponse::Ok().json(UserResponse::from(user.0)))
}

/// Points the authenticated user's avatar at a new image URL.
///
/// ## Responses:
/// - `200 OK`: The updated `UserResponse`.
/// - `422 Unprocessable Entity`: `avatar_url` is not a URL.
#[patch("/avatar")]
pub async fn update_avatar_user(
    pool: web::Data<PgPool>,
    body: web::Json<AvatarInput>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    body.validate()?;

    let updated = repository_users::update_avatar(&pool, &user.0.email, &body.avatar_url).await?;

    Ok(HttpResponse::Ok().json(UserResponse::from(updated)))
}
