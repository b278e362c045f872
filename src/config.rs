use std::env;
use std::fmt;
use std::time::Duration;

/// Settings for the outbound email API.
#[derive(Debug, Clone)]
pub struct EmailSettings {
    pub api_base_url: String,
    pub api_token: String,
    pub sender: String,
    pub timeout: Duration,
}

/// Lifetimes of the three kinds of JWT the service issues.
#[derive(Debug, Clone, Copy)]
pub struct TokenSettings {
    pub access_ttl: chrono::Duration,
    pub refresh_ttl: chrono::Duration,
    pub email_ttl: chrono::Duration,
}

pub struct Config {
    pub database_url: String,
    pub server_port: u16,
    pub server_host: String,
    /// Public URL used when building links in outgoing emails.
    pub app_base_url: String,
    pub jwt_secret: String,
    pub tokens: TokenSettings,
    pub email: EmailSettings,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str, String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid(key, value) => write!(f, "{} has an invalid value: {}", key, value),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup, so tests don't have to touch
    /// the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| lookup(key).ok_or(ConfigError::Missing(key));
        let parsed = |key: &'static str, default: i64| -> Result<i64, ConfigError> {
            match lookup(key) {
                Some(raw) => raw
                    .parse::<i64>()
                    .ok()
                    .filter(|value| *value > 0)
                    .ok_or(ConfigError::Invalid(key, raw)),
                None => Ok(default),
            }
        };

        let ttl = |key: &'static str,
                   default: i64,
                   to_duration: fn(i64) -> Option<chrono::Duration>|
         -> Result<chrono::Duration, ConfigError> {
            let value = parsed(key, default)?;
            to_duration(value).ok_or_else(|| ConfigError::Invalid(key, value.to_string()))
        };

        let server_host = lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let server_port = match lookup("SERVER_PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid("SERVER_PORT", raw))?,
            None => 8080,
        };
        let app_base_url = lookup("APP_BASE_URL")
            .unwrap_or_else(|| format!("http://{}:{}", server_host, server_port));

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            server_port,
            server_host,
            app_base_url: app_base_url.trim_end_matches('/').to_string(),
            jwt_secret: required("JWT_SECRET")?,
            tokens: TokenSettings {
                access_ttl: ttl("ACCESS_TOKEN_TTL_MINUTES", 15, chrono::Duration::try_minutes)?,
                refresh_ttl: ttl("REFRESH_TOKEN_TTL_DAYS", 7, chrono::Duration::try_days)?,
                email_ttl: ttl("EMAIL_TOKEN_TTL_DAYS", 7, chrono::Duration::try_days)?,
            },
            email: EmailSettings {
                api_base_url: required("EMAIL_API_BASE_URL")?,
                api_token: required("EMAIL_API_TOKEN")?,
                sender: required("EMAIL_SENDER")?,
                timeout: Duration::from_millis(parsed("EMAIL_TIMEOUT_MS", 10_000)? as u64),
            },
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}
