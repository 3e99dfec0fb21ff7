//! Resend implementation of MailSender.

use async_trait::async_trait;
use serde_json::json;

use crate::config::EmailConfig;
use crate::domain::foundation::DomainError;
use crate::ports::{EmailMessage, MailSender};

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

/// MailSender backed by the Resend HTTP API.
///
/// `send` spawns the outbound request on the runtime and returns
/// immediately; delivery failures are logged, never surfaced. This is
/// what keeps lifecycle workflows from blocking on email.
pub struct ResendMailSender {
    client: reqwest::Client,
    api_key: String,
    from: String,
}

impl ResendMailSender {
    /// Creates a sender from the email configuration.
    pub fn new(config: &EmailConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.resend_api_key.clone(),
            from: config.from_header(),
        }
    }
}

#[async_trait]
impl MailSender for ResendMailSender {
    async fn send(&self, message: EmailMessage) -> Result<(), DomainError> {
        let client = self.client.clone();
        let api_key = self.api_key.clone();
        let payload = json!({
            "from": self.from,
            "to": [message.to],
            "subject": message.subject,
            "text": message.body,
        });
        let to = message.to;

        tokio::spawn(async move {
            let response = client
                .post(RESEND_ENDPOINT)
                .bearer_auth(api_key)
                .json(&payload)
                .send()
                .await;
            match response {
                Ok(response) if response.status().is_success() => {
                    tracing::debug!(%to, "email accepted for delivery");
                }
                Ok(response) => {
                    tracing::warn!(%to, status = %response.status(), "email delivery rejected");
                }
                Err(err) => {
                    tracing::warn!(%to, error = %err, "email delivery failed");
                }
            }
        });

        Ok(())
    }
}
