//! JSON mail relay client.

use async_trait::async_trait;

use usof_core::ports::{MailError, MailMessage, Mailer};

#[derive(Debug, Clone)]
pub struct HttpMailerConfig {
    /// Relay endpoint accepting `{from, to, subject, html}`.
    pub url: String,
    pub api_key: Option<String>,
    pub from: String,
}

/// Posts each message to an HTTP mail relay.
pub struct HttpMailer {
    config: HttpMailerConfig,
    client: reqwest::Client,
}

impl HttpMailer {
    pub fn new(config: HttpMailerConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        let payload = serde_json::json!({
            "from": self.config.from,
            "to": message.to,
            "subject": message.subject,
            "html": message.html,
        });

        let mut request = self.client.post(&self.config.url).json(&payload);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MailError::Rejected {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}
