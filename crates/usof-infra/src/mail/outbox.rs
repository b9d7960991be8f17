use std::sync::Mutex;

use async_trait::async_trait;

use usof_core::ports::{MailError, MailMessage, Mailer};

/// Keeps every message in memory. Can be switched to fail every send.
#[derive(Debug, Default)]
pub struct OutboxMailer {
    sent: Mutex<Vec<MailMessage>>,
    failing: bool,
}

impl OutboxMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer whose transport is always down.
    pub fn failing() -> Self {
        Self {
            sent: Mutex::default(),
            failing: true,
        }
    }

    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Last message addressed to `to`.
    pub fn last_to(&self, to: &str) -> Option<MailMessage> {
        self.sent().into_iter().rev().find(|m| m.to == to)
    }
}

#[async_trait]
impl Mailer for OutboxMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        if self.failing {
            return Err(MailError::Transport("relay unreachable".to_string()));
        }
        self.sent
            .lock()
            .map_err(|e| MailError::Transport(e.to_string()))?
            .push(message);
        Ok(())
    }
}
