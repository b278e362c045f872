use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

lazy_static! {
    // Regex for username validation: alphanumeric, underscores, hyphens
    static ref USERNAME_REGEX: regex::Regex = regex::Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
}

/// A user row as stored in the database.
///
/// Not serializable on purpose: responses go through [`UserResponse`] so the password hash
/// and refresh token never leave the server.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub avatar: Option<String>,
    pub refresh_token: Option<String>,
    pub confirmed: bool,
    pub created_at: DateTime<Utc>,
}

/// Payload for a new account.
#[derive(Debug, Deserialize, Validate)]
pub struct UserInput {
    /// Between 3 and 32 characters, alphanumeric, underscores or hyphens.
    #[validate(
        length(min = 3, max = 32),
        regex(
            path = "USERNAME_REGEX",
            message = "Username must be alphanumeric, underscores, or hyphens"
        )
    )]
    pub username: String,
    #[validate(email, length(max = 250))]
    pub email: String,
    /// bcrypt only looks at the first 72 bytes.
    #[validate(length(min = 6, max = 72))]
    pub password: String,
}

/// Public view of a user.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub avatar: Option<String>,
    pub confirmed: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            avatar: user.avatar,
            confirmed: user.confirmed,
            created_at: user.created_at,
        }
    }
}

/// Response to a successful signup.
#[derive(Debug, Serialize, Deserialize)]
pub struct SignupResponse {
    pub user: UserResponse,
    pub detail: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AvatarInput {
    #[validate(url)]
    pub avatar_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_user_input_validation() {
        let input = UserInput {
            username: "test_user-123".to_string(),
            email: "test@example.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(input.validate().is_ok());

        let input = UserInput {
            username: "testuser".to_string(),
            email: "invalid-email".to_string(),
            password: "password123".to_string(),
        };
        assert!(input.validate().is_err());

        let input = UserInput {
            username: "test user!".to_string(),
            email: "test@example.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(input.validate().is_err());

        let input = UserInput {
            username: "tu".to_string(),
            email: "test@example.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(input.validate().is_err());

        let input = UserInput {
            username: "testuser".to_string(),
            email: "test@example.com".to_string(),
            password: "short".to_string(),
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_user_email_fits_column() {
        let domain = format!(
            "{}.{}.{}.{}.com",
            "a".repeat(60),
            "b".repeat(60),
            "c".repeat(60),
            "d".repeat(60)
        );
        let signup = |email: String| UserInput {
            username: "longmail".to_string(),
            email,
            password: "password123".to_string(),
        };

        let at_limit = format!("us@{}", domain);
        assert_eq!(at_limit.len(), 250);
        assert!(signup(at_limit).validate().is_ok());

        let too_long = format!("user@{}", domain);
        assert_eq!(too_long.len(), 252);
        assert!(signup(too_long).validate().is_err());
    }

    #[test]
    fn test_user_response_hides_secrets() {
        let user = User {
            id: 7,
            username: "jane".into(),
            email: "jane@example.com".into(),
            password_hash: "$2b$12$hash".into(),
            avatar: None,
            refresh_token: Some("refresh".into()),
            confirmed: true,
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(UserResponse::from(user)).unwrap();
        assert_eq!(json["id"], 7);
        assert!(json.get("password_hash").is_none());
        assert!(json.get("refresh_token").is_none());
    }

    #[test]
    fn test_avatar_input_requires_url() {
        let ok = AvatarInput {
            avatar_url: "https://cdn.example.com/a.png".into(),
        };
        assert!(ok.validate().is_ok());

        let bad = AvatarInput {
            avatar_url: "not a url".into(),
        };
        assert!(bad.validate().is_err());
    }
}
