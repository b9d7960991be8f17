use async_trait::async_trait;

use usof_core::ports::{MailError, MailMessage, Mailer};
use usof_core::services::mask_email;

/// Development mailer - writes each message to the log instead of sending.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        tracing::info!(
            to = %mask_email(&message.to),
            subject = %message.subject,
            body = %message.html,
            "Mail (not sent, no relay configured)"
        );
        Ok(())
    }
}
