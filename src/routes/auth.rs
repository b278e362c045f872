use crate::{
    email_client::EmailClient,
    error::AppError,
    models::{SignupResponse, UserInput},
    repository::users as repository_users,
    services::auth::{
        bearer_token, gravatar_url, hash_password, verify_password, LoginRequest,
        MessageResponse, RequestEmail, TokenResponse, TokenService,
    },
    services::email::spawn_verification_email,
    startup::ApplicationBaseUrl,
};
use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use sqlx::PgPool;
use validator::Validate;

/// Runs a CPU-heavy bcrypt call off the async worker.
async fn blocking<F, T>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    web::block(f)
        .await
        .map_err(|e| AppError::InternalServerError(format!("Blocking task failed: {}", e)))?
}

/// Register a new user
///
/// Creates an unconfirmed account with a Gravatar avatar and emails a confirmation link.
/// The email is sent in the background; delivery problems do not fail the request.
///
/// ## Responses:
/// - `201 Created`: `{"user": UserResponse, "detail": "..."}`.
/// - `409 Conflict`: An account with this email already exists.
/// - `422 Unprocessable Entity`: Input validation failed.
#[post("/signup")]
pub async fn signup(
    pool: web::Data<PgPool>,
    tokens: web::Data<TokenService>,
    email_client: web::Data<EmailClient>,
    base_url: web::Data<ApplicationBaseUrl>,
    body: web::Json<UserInput>,
) -> Result<impl Responder, AppError> {
    body.validate()?;
    let body = body.into_inner();

    if repository_users::get_user_by_email(&pool, &body.email)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Account already exists".into()));
    }

    let password = body.password.clone();
    let password_hash = blocking(move || hash_password(&password)).await?;
    let avatar = gravatar_url(&body.email);

    let user = repository_users::create_user(&pool, &body, &password_hash, Some(&avatar))
        .await
        .map_err(|e| match e {
            // Lost a race against a concurrent signup with the same email.
            AppError::Conflict(_) => AppError::Conflict("Account already exists".into()),
            other => other,
        })?;
    log::info!("created user {} ({})", user.id, user.email);

    spawn_verification_email(
        email_client.get_ref().clone(),
        tokens.get_ref().clone(),
        user.email.clone(),
        user.username.clone(),
        base_url.0.clone(),
    );

    Ok(HttpResponse::Created().json(SignupResponse {
        user: user.into(),
        detail: "User successfully created. Check your email for confirmation.".into(),
    }))
}

/// Login user
///
/// Exchanges email and password for an access/refresh token pair. The refresh token is stored
/// on the user and replaces any previous one.
///
/// ## Responses:
/// - `200 OK`: `TokenResponse`.
/// - `401 Unauthorized`: Unknown email, unconfirmed email or wrong password.
/// - `422 Unprocessable Entity`: Input validation failed.
#[post("/login")]
pub async fn login(
    pool: web::Data<PgPool>,
    tokens: web::Data<TokenService>,
    body: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    body.validate()?;
    let body = body.into_inner();

    let user = repository_users::get_user_by_email(&pool, &body.email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid email".into()))?;

    if !user.confirmed {
        return Err(AppError::Unauthorized("Email not confirmed".into()));
    }

    let stored_hash = user.password_hash.clone();
    let password = body.password;
    if !blocking(move || verify_password(&password, &stored_hash)).await? {
        return Err(AppError::Unauthorized("Invalid password".into()));
    }

    let access_token = tokens.create_access_token(&user.email)?;
    let refresh = tokens.create_refresh_token(&user.email)?;
    repository_users::update_token(&pool, user.id, Some(&refresh)).await?;

    Ok(HttpResponse::Ok().json(TokenResponse::bearer(access_token, refresh)))
}

/// Rotate tokens
///
/// Expects the current refresh token as a bearer token. A refresh token that does not match
/// the stored one is treated as stolen: the stored token is cleared, forcing a new login.
#[get("/refresh_token")]
pub async fn refresh_token(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    tokens: web::Data<TokenService>,
) -> Result<impl Responder, AppError> {
    let token = bearer_token(req.headers())
        .ok_or_else(|| AppError::Unauthorized("Not authenticated".into()))?;
    let email = tokens.decode_refresh_token(token)?;

    let user = repository_users::get_user_by_email(&pool, &email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Could not validate credentials".into()))?;

    if user.refresh_token.as_deref() != Some(token) {
        log::warn!("refresh token mismatch for user {}, revoking", user.id);
        repository_users::update_token(&pool, user.id, None).await?;
        return Err(AppError::Unauthorized("Invalid refresh token".into()));
    }

    let access_token = tokens.create_access_token(&email)?;
    let refresh = tokens.create_refresh_token(&email)?;
    repository_users::update_token(&pool, user.id, Some(&refresh)).await?;

    Ok(HttpResponse::Ok().json(TokenResponse::bearer(access_token, refresh)))
}

/// Confirm an email address from the link sent at signup.
#[get("/confirmed_email/{token}")]
pub async fn confirmed_email(
    token: web::Path<String>,
    pool: web::Data<PgPool>,
    tokens: web::Data<TokenService>,
) -> Result<impl Responder, AppError> {
    let email = tokens.get_email_from_token(&token)?;

    let user = repository_users::get_user_by_email(&pool, &email)
        .await?
        .ok_or_else(|| AppError::BadRequest("Verification error".into()))?;

    if user.confirmed {
        return Ok(HttpResponse::Ok().json(MessageResponse::new("Your email is already confirmed")));
    }

    repository_users::confirmed_email(&pool, &email).await?;
    log::info!("user {} confirmed their email", user.id);

    Ok(HttpResponse::Ok().json(MessageResponse::new("Email confirmed")))
}

/// Resend the confirmation link.
///
/// Answers the same way whether or not the address is registered.
#[post("/request_email")]
pub async fn request_email(
    pool: web::Data<PgPool>,
    tokens: web::Data<TokenService>,
    email_client: web::Data<EmailClient>,
    base_url: web::Data<ApplicationBaseUrl>,
    body: web::Json<RequestEmail>,
) -> Result<impl Responder, AppError> {
    body.validate()?;

    if let Some(user) = repository_users::get_user_by_email(&pool, &body.email).await? {
        if user.confirmed {
            return Ok(HttpResponse::Ok().json(MessageResponse::new("Your email is already confirmed")));
        }
        spawn_verification_email(
            email_client.get_ref().clone(),
            tokens.get_ref().clone(),
            user.email,
            user.username,
            base_url.0.clone(),
        );
    }

    Ok(HttpResponse::Ok().json(MessageResponse::new("Check your email for confirmation.")))
}
