use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error};

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Hands a rendered message to an email delivery service.
#[async_trait]
pub trait EmailTransport: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> AppResult<()>;
}

/// Mailgun messages API: form-encoded POST with basic auth `api:<key>`.
/// One attempt per message; a non-2xx answer is a `DeliveryFailure`.
#[derive(Clone)]
pub struct MailgunTransport {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl MailgunTransport {
    pub fn new(endpoint: String, api_key: String, timeout: Option<Duration>) -> AppResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let client = builder
            .build()
            .map_err(|e| AppError::input("http_client".to_string(), e.to_string()))?;
        Ok(Self { client, endpoint, api_key })
    }

    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let Some(key) = config.mailgun_api_key.clone() else {
            return Err(AppError::input("missing_mailgun_key", "MAILGUN_API_KEY is not set"));
        };
        Self::new(config.mailgun_endpoint(), key, config.http_timeout_secs.map(Duration::from_secs))
    }

    pub fn endpoint(&self) -> &str { &self.endpoint }
}

#[async_trait]
impl EmailTransport for MailgunTransport {
    async fn send(&self, message: &EmailMessage) -> AppResult<()> {
        let form = [
            ("from", message.from.as_str()),
            ("to", message.to.as_str()),
            ("subject", message.subject.as_str()),
            ("html", message.html.as_str()),
        ];
        let resp = self
            .client
            .post(&self.endpoint)
            .basic_auth("api", Some(&self.api_key))
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                error!(target: "bilo::email", to = %message.to, error = %e, "email API unreachable");
                AppError::delivery(None, e.to_string())
            })?;
        let status = resp.status();
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("unknown status").to_string();
            error!(target: "bilo::email", to = %message.to, status = status.as_u16(), "email API rejected message: {}", reason);
            return Err(AppError::delivery(Some(status.as_u16()), reason));
        }
        debug!(target: "bilo::email", to = %message.to, subject = %message.subject, "email accepted");
        Ok(())
    }
}
