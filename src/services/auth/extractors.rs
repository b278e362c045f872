use actix_web::dev::Payload;
use actix_web::{web, Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;
use sqlx::PgPool;

use super::Claims;
use crate::error::AppError;
use crate::models::User;
use crate::repository::users as repository_users;

/// The user behind the access token of the current request.
///
/// Relies on `AuthMiddleware` having stored the token's [`Claims`] in the request extensions.
/// The user is loaded fresh from the database, so a deleted account stops working immediately
/// even while its tokens are still within their lifetime.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequest for CurrentUser {
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let email = req.extensions().get::<Claims>().map(|claims| claims.sub.clone());
        let pool = req.app_data::<web::Data<PgPool>>().cloned();

        Box::pin(async move {
            let email = email.ok_or_else(|| {
                AppError::Unauthorized("Could not validate credentials".into())
            })?;
            let pool = pool.ok_or_else(|| {
                log::error!("PgPool is not registered as app data");
                AppError::InternalServerError("Database unavailable".into())
            })?;

            match repository_users::get_user_by_email(&pool, &email).await? {
                Some(user) => Ok(CurrentUser(user)),
                None => Err(AppError::Unauthorized("Could not validate credentials".into()).into()),
            }
        })
    }
}
