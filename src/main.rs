use std::net::TcpListener;

use contacts_app::config::Config;
use contacts_app::email_client::EmailClient;
use contacts_app::services::auth::TokenService;
use contacts_app::startup;
use sqlx::postgres::PgPoolOptions;

fn other_error<E: std::fmt::Display>(context: &str, error: E) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, error))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| other_error("Invalid configuration", e))?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .map_err(|e| other_error("Failed to connect to database", e))?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| other_error("Failed to run migrations", e))?;

    let tokens = TokenService::new(&config.jwt_secret, config.tokens);
    let email_client = EmailClient::from_settings(&config.email)
        .map_err(|e| other_error("Failed to build email client", e))?;

    let listener = TcpListener::bind((config.server_host.as_str(), config.server_port))?;
    log::info!("Starting Contacts App server at {}", config.server_url());

    startup::run(
        listener,
        pool,
        tokens,
        email_client,
        config.app_base_url.clone(),
    )?
    .await
}
