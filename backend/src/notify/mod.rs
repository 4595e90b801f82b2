//! Notification sinks.
//!
//! The engine only produces subject/body pairs. Sinks decide how they reach a
//! human; the dispatcher treats every sink as fire-and-forget.

pub mod log;
pub mod webhook;

pub use self::log::LogSink;
pub use self::webhook::WebhookSink;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::DeliveryError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyFormat {
    #[default]
    Text,
    Html,
}

impl FromStr for BodyFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "plain" => Ok(BodyFormat::Text),
            "html" => Ok(BodyFormat::Html),
            other => Err(format!("unknown body format `{other}` (expected text or html)")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MessageBody {
    Plain(String),
    Html(String),
}

impl MessageBody {
    /// Renders plain alert text in `format`.
    pub fn render(text: &str, format: BodyFormat) -> Self {
        match format {
            BodyFormat::Text => MessageBody::Plain(text.to_string()),
            BodyFormat::Html => MessageBody::Html(
                text.lines()
                    .map(escape_html)
                    .collect::<Vec<_>>()
                    .join("<br>"),
            ),
        }
    }

    pub fn content(&self) -> &str {
        match self {
            MessageBody::Plain(s) | MessageBody::Html(s) => s,
        }
    }

    pub fn format(&self) -> BodyFormat {
        match self {
            MessageBody::Plain(_) => BodyFormat::Text,
            MessageBody::Html(_) => BodyFormat::Html,
        }
    }
}

impl fmt::Display for MessageBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.content())
    }
}

fn escape_html(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    for c in line.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub recipient: Option<String>,
    pub subject: String,
    pub body: MessageBody,
}

/// Delivery channel for alerts.
#[async_trait]
pub trait NotificationSink: Send + Sync + 'static {
    async fn send(&self, notification: &Notification) -> Result<(), DeliveryError>;
}
