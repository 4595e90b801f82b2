use async_trait::async_trait;
use tracing::info;

use super::{Notification, NotificationSink};
use crate::error::DeliveryError;

/// Dry-run sink: alerts end up in the log stream only.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn send(&self, notification: &Notification) -> Result<(), DeliveryError> {
        info!(
            target: "notification",
            to = notification.recipient.as_deref().unwrap_or("-"),
            subject = %notification.subject,
            body = %notification.body,
            "alert"
        );
        Ok(())
    }
}
