use async_trait::async_trait;

use crate::engine::Error;

/// Template used for the welcome/password-setup message sent when an
/// administrator creates an account.
pub const SETUP_PASSWORD_TEMPLATE: &str = "setup-password";

/// Outbound notification seam (SMTP + HTML templates in production). The
/// engine hands over a template name and a JSON payload; rendering and
/// delivery are the implementation's problem.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send_template_message(
        &self,
        to: &str,
        subject: &str,
        template: &str,
        data: serde_json::Value,
    ) -> Result<(), Error>;
}

/// Sender that drops every message. For deployments without an outbound
/// channel and for tests that don't inspect notifications.
pub struct NullNotifier;

#[async_trait]
impl NotificationSender for NullNotifier {
    async fn send_template_message(
        &self,
        to: &str,
        _subject: &str,
        template: &str,
        _data: serde_json::Value,
    ) -> Result<(), Error> {
        tracing::debug!(to, template, "notification dropped (null sender)");
        Ok(())
    }
}
