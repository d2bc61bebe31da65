use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use super::{Ack, NotificationSender, SendError};

/// A message accepted by [`InMemoryMailSender`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub contact: String,
    pub subject: String,
    pub body: String,
}

/// Recording sender for tests/dev.
///
/// Contacts registered with [`reject`](Self::reject) fail with
/// `SendError::Rejected`; everything else is recorded and acknowledged.
#[derive(Debug, Default)]
pub struct InMemoryMailSender {
    sent: Mutex<Vec<SentMessage>>,
    rejected: Mutex<HashSet<String>>,
}

impl InMemoryMailSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject(&self, contact: impl Into<String>) {
        self.rejected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(contact.into());
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn sent_to(&self, contact: &str) -> Vec<SentMessage> {
        self.sent()
            .into_iter()
            .filter(|m| m.contact == contact)
            .collect()
    }
}

#[async_trait]
impl NotificationSender for InMemoryMailSender {
    async fn send(&self, contact: &str, subject: &str, body: &str) -> Result<Ack, SendError> {
        if self
            .rejected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(contact)
        {
            return Err(SendError::Rejected {
                contact: contact.to_string(),
                reason: "mailbox unavailable".to_string(),
            });
        }

        let mut sent = self.sent.lock().unwrap_or_else(PoisonError::into_inner);
        sent.push(SentMessage {
            contact: contact.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(Ack::new(format!("mem-{}", sent.len())))
    }
}
