use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use super::{Ack, NotificationSender, SendError};

/// Sender that "delivers" by logging the message.
///
/// Stands in for a real mail transport in dev deployments: every message is
/// accepted and written to the log with recipient, subject and body.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailSender;

impl LogMailSender {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotificationSender for LogMailSender {
    async fn send(&self, contact: &str, subject: &str, body: &str) -> Result<Ack, SendError> {
        let message_id = Uuid::now_v7().to_string();
        info!(
            message_id = %message_id,
            to = %contact,
            subject = %subject,
            body = %body,
            "sending email"
        );
        Ok(Ack::new(message_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn always_acknowledges() {
        let ack = LogMailSender::new()
            .send("test@example.com", "Test Email", "hello")
            .await
            .unwrap();
        assert!(!ack.message_id.is_empty());
    }
}
