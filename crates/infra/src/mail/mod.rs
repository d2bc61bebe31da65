//! Notification transport port.
//!
//! Delivery itself is out of the engine's hands: the engine hands a
//! contact, subject and body to a [`NotificationSender`] and records what
//! came back.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub mod in_memory;
pub mod log_sender;

pub use in_memory::InMemoryMailSender;
pub use log_sender::LogMailSender;

/// Transport acknowledgement for one accepted message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ack {
    pub message_id: String,
}

impl Ack {
    pub fn new(message_id: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
        }
    }
}

/// Transport error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    /// The transport refused this destination or message.
    #[error("message to {contact} rejected: {reason}")]
    Rejected { contact: String, reason: String },
    /// The transport itself failed.
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Sends a single message to a contact.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, contact: &str, subject: &str, body: &str) -> Result<Ack, SendError>;
}
