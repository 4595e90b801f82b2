use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, instrument};

use super::{BodyFormat, Notification, NotificationSink};
use crate::error::DeliveryError;

/// Posts each notification as JSON to an HTTP endpoint (mail relay, chat bot
/// bridge, ...).
#[derive(Clone)]
pub struct WebhookSink {
    http: Client,
    url: String,
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    to: Option<&'a str>,
    subject: &'a str,
    body: &'a str,
    content_type: BodyFormat,
}

impl WebhookSink {
    pub fn new(url: String, timeout: Duration) -> Result<Self, DeliveryError> {
        let http = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self { http, url })
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    #[instrument(skip_all, fields(subject = %notification.subject), level = "debug")]
    async fn send(&self, notification: &Notification) -> Result<(), DeliveryError> {
        let payload = WebhookPayload {
            to: notification.recipient.as_deref(),
            subject: &notification.subject,
            body: notification.body.content(),
            content_type: notification.body.format(),
        };

        let resp = self
            .http
            .post(&self.url)
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!(status = status.as_u16(), "webhook notification delivered");
        Ok(())
    }
}
