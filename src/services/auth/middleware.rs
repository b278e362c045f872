use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use super::{bearer_token, TokenService};
use crate::error::AppError;

/// Requires a valid access token on every request it wraps, except the public
/// `/api/auth/*` endpoints and the health check.
///
/// On success the decoded [`Claims`](super::Claims) are stored in the request extensions for
/// [`CurrentUser`](super::CurrentUser) to pick up.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

fn is_public(path: &str) -> bool {
    path == "/health" || path.starts_with("/api/auth/")
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if is_public(req.path()) {
            return Box::pin(self.service.call(req));
        }

        let tokens = match req.app_data::<web::Data<TokenService>>() {
            Some(tokens) => tokens.clone(),
            None => {
                log::error!("TokenService is not registered as app data");
                let app_err = AppError::InternalServerError("Authentication unavailable".into());
                return Box::pin(async move { Err(app_err.into()) });
            }
        };

        let claims = match bearer_token(req.headers()) {
            Some(token) => tokens.decode_access_token(token),
            None => Err(AppError::Unauthorized("Not authenticated".into())),
        };

        match claims {
            Ok(claims) => {
                req.extensions_mut().insert(claims);
                Box::pin(self.service.call(req))
            }
            Err(app_err) => Box::pin(async move { Err(app_err.into()) }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TokenSettings;
    use crate::services::auth::Claims;
    use actix_web::{http::StatusCode, test, App, HttpRequest, HttpResponse};

    fn tokens() -> TokenService {
        TokenService::new(
            "middleware_test_secret",
            TokenSettings {
                access_ttl: chrono::Duration::minutes(15),
                refresh_ttl: chrono::Duration::days(7),
                email_ttl: chrono::Duration::days(7),
            },
        )
    }

    async fn whoami(req: HttpRequest) -> HttpResponse {
        let sub = req
            .extensions()
            .get::<Claims>()
            .map(|claims| claims.sub.clone())
            .unwrap_or_default();
        HttpResponse::Ok().body(sub)
    }

    #[actix_web::test]
    async fn test_middleware_accepts_access_token() {
        let tokens = tokens();
        let token = tokens.create_access_token("mw@example.com").unwrap();
        let app = test::init_service(
            App::new().app_data(web::Data::new(tokens)).service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .route("/whoami", web::get().to(whoami)),
            ),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/whoami")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(test::read_body(resp).await, "mw@example.com");
    }

    #[actix_web::test]
    async fn test_middleware_rejects_missing_and_wrong_tokens() {
        let tokens = tokens();
        let refresh = tokens.create_refresh_token("mw@example.com").unwrap();
        let app = test::init_service(
            App::new().app_data(web::Data::new(tokens)).service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .route("/whoami", web::get().to(whoami)),
            ),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/whoami").to_request();
        let err = test::try_call_service(&app, req).await.unwrap_err();
        assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri("/api/whoami")
            .insert_header(("Authorization", format!("Bearer {}", refresh)))
            .to_request();
        let err = test::try_call_service(&app, req).await.unwrap_err();
        assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_middleware_skips_auth_routes() {
        let app = test::init_service(
            App::new().app_data(web::Data::new(tokens())).service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .route("/auth/login", web::post().to(HttpResponse::Ok)),
            ),
        )
        .await;

        let req = test::TestRequest::post().uri("/api/auth/login").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
