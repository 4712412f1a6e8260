use serde::Serialize;

use crate::error::EmailError;
use crate::validators::is_valid_email;

/// HTTP client for the outbound mail service.
///
/// Delivery is best-effort: callers in the password reset flow log and
/// swallow send failures, so an undeliverable reset email never rolls back
/// an issued token.
#[derive(Clone)]
pub struct EmailClient {
    http_client: reqwest::Client,
    base_url: String,
    sender: SenderEmail,
}

/// A validated sender address
#[derive(Clone)]
pub struct SenderEmail(String);

impl SenderEmail {
    pub fn parse(s: String) -> Result<Self, EmailError> {
        let email = is_valid_email(&s)
            .map_err(|e| EmailError::ConfigurationError(format!("sender: {}", e)))?;
        Ok(Self(email))
    }

    pub fn inner(&self) -> &str {
        &self.0
    }
}

#[derive(Serialize)]
pub struct SendEmailRequest {
    from: String,
    to: String,
    #[serde(rename = "Subject")]
    subject: String,
    #[serde(rename = "Body")]
    body: String,
}

impl EmailClient {
    pub fn new(base_url: String, sender: SenderEmail, http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            base_url,
            sender,
        }
    }

    pub async fn send_email(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), EmailError> {
        let url = format!("{}/email", self.base_url);
        let request = SendEmailRequest {
            from: self.sender.inner().to_string(),
            to: recipient.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        };

        self.http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send email: {}", e);
                EmailError::SendFailed(e.to_string())
            })?
            .error_for_status()
            .map_err(|e| {
                tracing::error!("Email service returned error: {}", e);
                EmailError::ServiceUnavailable(e.to_string())
            })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_parse_valid_email() {
        let email = "noreply@example.com".to_string();
        let sender = SenderEmail::parse(email);
        assert!(sender.is_ok());
    }

    #[test]
    fn test_sender_parse_invalid_email() {
        let email = "invalid-email".to_string();
        let sender = SenderEmail::parse(email);
        assert!(sender.is_err());
    }
}
