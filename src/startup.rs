use actix_cors::Cors;
use actix_web::dev::Server;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use sqlx::PgPool;
use std::net::TcpListener;

use crate::email_client::EmailClient;
use crate::routes::{self, health};
use crate::services::auth::{AuthMiddleware, TokenService};

/// Public base URL of the service, used to build links in outgoing emails.
#[derive(Debug, Clone)]
pub struct ApplicationBaseUrl(pub String);

/// Builds the HTTP server on an already bound listener.
///
/// The returned `Server` must be awaited (or spawned) to start accepting connections.
pub fn run(
    listener: TcpListener,
    pool: PgPool,
    tokens: TokenService,
    email_client: EmailClient,
    base_url: String,
) -> Result<Server, std::io::Error> {
    let pool = web::Data::new(pool);
    let tokens = web::Data::new(tokens);
    let email_client = web::Data::new(email_client);
    let base_url = web::Data::new(ApplicationBaseUrl(base_url));

    let server = HttpServer::new(move || {
        App::new()
            .app_data(pool.clone())
            .app_data(tokens.clone())
            .app_data(email_client.clone())
            .app_data(base_url.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(health::health)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
