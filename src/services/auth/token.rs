use crate::config::TokenSettings;
use crate::error::AppError;
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// What a token may be used for. Encoded in every JWT the service issues, so a token of one
/// kind is rejected wherever another kind is expected.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenScope {
    AccessToken,
    RefreshToken,
    EmailToken,
}

/// Represents the claims encoded within a JWT.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Email address of the user the token was issued for.
    pub sub: String,
    pub scope: TokenScope,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: usize,
    /// Expiration timestamp (seconds since epoch).
    pub exp: usize,
}

/// Issues and verifies the access, refresh and email-verification tokens.
///
/// Shared across workers through `web::Data<TokenService>`.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    settings: TokenSettings,
}

impl TokenService {
    pub fn new(secret: &str, settings: TokenSettings) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            settings,
        }
    }

    pub fn create_access_token(&self, email: &str) -> Result<String, AppError> {
        self.issue(email, TokenScope::AccessToken, self.settings.access_ttl)
    }

    pub fn create_refresh_token(&self, email: &str) -> Result<String, AppError> {
        self.issue(email, TokenScope::RefreshToken, self.settings.refresh_ttl)
    }

    pub fn create_email_token(&self, email: &str) -> Result<String, AppError> {
        self.issue(email, TokenScope::EmailToken, self.settings.email_ttl)
    }

    /// Verifies an access token and returns its claims.
    ///
    /// Bad signatures, expired tokens and tokens of another scope all yield
    /// `AppError::Unauthorized`.
    pub fn decode_access_token(&self, token: &str) -> Result<Claims, AppError> {
        let claims = self
            .decode(token)
            .map_err(|_| AppError::Unauthorized("Could not validate credentials".into()))?;

        if claims.scope != TokenScope::AccessToken {
            return Err(AppError::Unauthorized("Could not validate credentials".into()));
        }
        Ok(claims)
    }

    /// Verifies a refresh token and returns the email it was issued for.
    pub fn decode_refresh_token(&self, token: &str) -> Result<String, AppError> {
        let claims = self
            .decode(token)
            .map_err(|_| AppError::Unauthorized("Could not validate credentials".into()))?;

        if claims.scope != TokenScope::RefreshToken {
            return Err(AppError::Unauthorized("Invalid scope for token".into()));
        }
        Ok(claims.sub)
    }

    /// Verifies an email-verification token and returns the address it confirms.
    pub fn get_email_from_token(&self, token: &str) -> Result<String, AppError> {
        let invalid = || AppError::ValidationError("Invalid token for email verification".into());

        let claims = self.decode(token).map_err(|e| {
            log::warn!("rejected email verification token: {}", e);
            invalid()
        })?;

        if claims.scope != TokenScope::EmailToken {
            return Err(invalid());
        }
        Ok(claims.sub)
    }

    fn issue(
        &self,
        email: &str,
        scope: TokenScope,
        ttl: chrono::Duration,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(ttl)
            .ok_or_else(|| AppError::InternalServerError("Token lifetime out of range".into()))?;

        let claims = Claims {
            sub: email.to_owned(),
            scope,
            iat: now.timestamp() as usize,
            exp: expiration.timestamp() as usize,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
    }

    fn decode(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default()).map(|data| data.claims)
    }
}
