//! Verification mail for new accounts.

use crate::email_client::EmailClient;
use crate::error::AppError;
use crate::services::auth::TokenService;

pub const VERIFICATION_SUBJECT: &str = "Confirm your email";

/// Body of a verification email in both renderings.
#[derive(Debug, PartialEq)]
pub struct VerificationEmail {
    pub html: String,
    pub text: String,
}

pub fn confirmation_link(base_url: &str, token: &str) -> String {
    format!(
        "{}/api/auth/confirmed_email/{}",
        base_url.trim_end_matches('/'),
        token
    )
}

pub fn render_verification_email(username: &str, link: &str) -> VerificationEmail {
    VerificationEmail {
        html: format!(
            "<p>Hi {username},</p>\
             <p>Thanks for signing up to Contacts App. \
             Please confirm your email address by clicking <a href=\"{link}\">here</a>.</p>",
            username = username,
            link = link
        ),
        text: format!(
            "Hi {},\nThanks for signing up to Contacts App.\nVisit {} to confirm your email address.",
            username, link
        ),
    }
}

/// Sends the confirmation link for `email` to its owner.
pub async fn send_verification_email(
    client: &EmailClient,
    tokens: &TokenService,
    email: &str,
    username: &str,
    base_url: &str,
) -> Result<(), AppError> {
    let token = tokens.create_email_token(email)?;
    let link = confirmation_link(base_url, &token);
    let message = render_verification_email(username, &link);

    client
        .send_email(email, VERIFICATION_SUBJECT, &message.html, &message.text)
        .await
        .map_err(|e| AppError::InternalServerError(format!("Failed to send email: {}", e)))
}

/// Fires off [`send_verification_email`] on the actix runtime without waiting for it.
/// Failures end up in the log; the HTTP caller never sees them.
pub fn spawn_verification_email(
    client: EmailClient,
    tokens: TokenService,
    email: String,
    username: String,
    base_url: String,
) {
    actix_web::rt::spawn(async move {
        match send_verification_email(&client, &tokens, &email, &username, &base_url).await {
            Ok(()) => log::info!("verification email sent to {}", email),
            Err(e) => log::error!("could not send verification email to {}: {}", email, e),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TokenSettings;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn tokens() -> TokenService {
        TokenService::new(
            "email_test_secret",
            TokenSettings {
                access_ttl: chrono::Duration::minutes(15),
                refresh_ttl: chrono::Duration::days(7),
                email_ttl: chrono::Duration::days(7),
            },
        )
    }

    #[test]
    fn test_confirmation_link_trims_trailing_slash() {
        assert_eq!(
            confirmation_link("http://localhost:8080/", "abc"),
            "http://localhost:8080/api/auth/confirmed_email/abc"
        );
    }

    #[test]
    fn test_rendered_email_contains_link() {
        let message = render_verification_email("User1", "http://host/link");
        assert!(message.html.contains("href=\"http://host/link\""));
        assert!(message.html.contains("User1"));
        assert!(message.text.contains("http://host/link"));
    }

    #[tokio::test]
    async fn test_verification_email_carries_a_valid_token() {
        let mock_server = MockServer::start().await;
        Mock::given(path("/email"))
            .and(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = EmailClient::new(
            mock_server.uri(),
            "noreply@example.com".into(),
            "token".into(),
            Duration::from_secs(1),
        )
        .unwrap();
        let tokens = tokens();

        send_verification_email(&client, &tokens, "user1@example.com", "User1", "http://app")
            .await
            .unwrap();

        let requests = mock_server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["To"], "user1@example.com");
        assert_eq!(body["Subject"], VERIFICATION_SUBJECT);

        let text = body["TextBody"].as_str().unwrap();
        let prefix = "http://app/api/auth/confirmed_email/";
        let start = text.find(prefix).unwrap() + prefix.len();
        let token = text[start..].split_whitespace().next().unwrap();
        assert_eq!(tokens.get_email_from_token(token).unwrap(), "user1@example.com");
    }

    #[tokio::test]
    async fn test_verification_email_reports_api_failure() {
        let mock_server = MockServer::start().await;
        Mock::given(path("/email"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let client = EmailClient::new(
            mock_server.uri(),
            "noreply@example.com".into(),
            "token".into(),
            Duration::from_secs(1),
        )
        .unwrap();

        let outcome =
            send_verification_email(&client, &tokens(), "user1@example.com", "User1", "http://app")
                .await;
        assert!(matches!(outcome, Err(AppError::InternalServerError(_))));
    }
}
