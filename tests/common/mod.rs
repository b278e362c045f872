//! Fixtures for the database-backed integration tests.
//!
//! These tests run against the Postgres named by `DATABASE_URL` (read through `.env` as well)
//! and return early when it is not set.
#![allow(dead_code)]

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{test, web, App};
use contacts_app::config::TokenSettings;
use contacts_app::email_client::EmailClient;
use contacts_app::routes::{self, health};
use contacts_app::services::auth::{AuthMiddleware, TokenResponse, TokenService};
use contacts_app::startup::ApplicationBaseUrl;
use dotenv::dotenv;
use serde_json::json;
use sqlx::PgPool;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_SECRET: &str = "integration_test_secret";

pub fn tokens() -> TokenService {
    TokenService::new(
        TEST_SECRET,
        TokenSettings {
            access_ttl: chrono::Duration::minutes(15),
            refresh_ttl: chrono::Duration::days(7),
            email_ttl: chrono::Duration::days(7),
        },
    )
}

/// `None` when no test database is configured.
pub async fn pool() -> Option<PgPool> {
    dotenv().ok();
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL is not set, skipping database test");
        return None;
    };
    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test DB");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate test DB");
    Some(pool)
}

/// Email API stand-in that accepts every message.
pub async fn email_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(path("/email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    server
}

pub async fn init_app(
    pool: &PgPool,
    email_server: &MockServer,
) -> impl Service<
    actix_http::Request,
    Response = ServiceResponse<impl MessageBody>,
    Error = actix_web::Error,
> {
    let email_client = EmailClient::new(
        email_server.uri(),
        "noreply@contacts.example.com".into(),
        "server-token".into(),
        Duration::from_secs(2),
    )
    .expect("Failed to build email client");

    test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(tokens()))
            .app_data(web::Data::new(email_client))
            .app_data(web::Data::new(ApplicationBaseUrl("http://localhost:8080".into())))
            .service(health::health)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            ),
    )
    .await
}

pub async fn cleanup_user(pool: &PgPool, email: &str) {
    let _ = sqlx::query("DELETE FROM users WHERE email = $1")
        .bind(email)
        .execute(pool)
        .await;
}

/// Signs a user up, confirms the address and logs in.
pub async fn signup_confirmed_user(
    app: &impl Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
    pool: &PgPool,
    username: &str,
    email: &str,
    password: &str,
) -> TokenResponse {
    cleanup_user(pool, email).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/signup")
        .set_json(json!({ "username": username, "email": email, "password": password }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert!(resp.status().is_success(), "signup failed: {}", resp.status());

    contacts_app::repository::users::confirmed_email(pool, email)
        .await
        .expect("Failed to confirm test user");

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": email, "password": password }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert!(resp.status().is_success(), "login failed: {}", resp.status());
    test::read_body_json(resp).await
}
