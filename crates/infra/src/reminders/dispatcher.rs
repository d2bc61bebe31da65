//! Reminder formatting and hand-off to the notification sender.

use std::sync::Arc;

use chrono::DateTime;
use chrono_tz::Tz;
use thiserror::Error;
use tracing::{debug, warn};

use rentwatch_core::{RentalId, ReminderWindow};

use crate::mail::{Ack, NotificationSender, SendError};

/// Dispatch failure for one rental. Recoverable: the scan records it and moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("notification for rental {rental_id} not sent: {source}")]
    Send {
        rental_id: RentalId,
        #[source]
        source: SendError,
    },
}

/// Subject/body pair for one reminder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderMessage {
    pub subject: String,
    pub body: String,
}

impl ReminderMessage {
    /// Render the template for `window`. The return date is shown on the
    /// customer's own clock.
    pub fn render(window: ReminderWindow, rental_id: RentalId, return_date: &DateTime<Tz>) -> Self {
        let due = return_date.format("%A %-d %B %Y at %H:%M %Z");
        match window {
            ReminderWindow::FiveDaysOut => Self {
                subject: format!("Reminder: rental #{rental_id} is due in 5 days"),
                body: format!(
                    "Your rental #{rental_id} is due on {due}. \
                     Please plan to return it within the next 5 days to avoid late fees."
                ),
            },
            ReminderWindow::ThreeDaysOut => Self {
                subject: format!("Last call: rental #{rental_id} is due in 3 days"),
                body: format!(
                    "Only 3 days left! Your rental #{rental_id} is due on {due}. \
                     Please return it on time to avoid late fees."
                ),
            },
        }
    }
}

/// Formats reminders and performs exactly one send attempt per call.
///
/// No retries and no internal state: a failed reminder is retried, if at
/// all, by the next scheduled scan.
#[derive(Clone)]
pub struct NotificationDispatcher {
    sender: Arc<dyn NotificationSender>,
}

impl NotificationDispatcher {
    pub fn new(sender: Arc<dyn NotificationSender>) -> Self {
        Self { sender }
    }

    pub async fn dispatch(
        &self,
        contact: &str,
        window: ReminderWindow,
        rental_id: RentalId,
        return_date: &DateTime<Tz>,
    ) -> Result<Ack, DispatchError> {
        let message = ReminderMessage::render(window, rental_id, return_date);

        match self.sender.send(contact, &message.subject, &message.body).await {
            Ok(ack) => {
                debug!(
                    rental_id = %rental_id,
                    window = %window,
                    message_id = %ack.message_id,
                    "reminder dispatched"
                );
                Ok(ack)
            }
            Err(source) => {
                warn!(rental_id = %rental_id, window = %window, error = %source, "reminder dispatch failed");
                Err(DispatchError::Send { rental_id, source })
            }
        }
    }
}
