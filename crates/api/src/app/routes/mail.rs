use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse};
use tracing::info;

use crate::app::errors;
use crate::app::services::AppServices;

pub const TEST_MAIL_CONTACT: &str = "test@example.com";

/// Push one fixed message through the configured sender.
pub async fn test_mail(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services
        .sender
        .send(TEST_MAIL_CONTACT, "Test Email", "This is a test email from your application.")
        .await
    {
        Ok(ack) => {
            info!(message_id = %ack.message_id, "test email sent");
            "Email log generated successfully.".into_response()
        }
        Err(e) => errors::json_error(StatusCode::BAD_GATEWAY, "send_failed", e.to_string()),
    }
}
