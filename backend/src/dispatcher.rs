//! Alert dispatcher.
//!
//! Rules hand alerts over through a bounded queue and move on; a single
//! worker renders and delivers them. Delivery never blocks evaluation:
//! a full queue drops the alert, and a failed send is logged and forgotten.

use std::sync::Arc;
use std::time::Duration;

use engine::AlertEvent;
use tokio::sync::mpsc::{self, Receiver, Sender, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::DeliveryError;
use crate::metrics::counters::Counters;
use crate::notify::{BodyFormat, MessageBody, Notification, NotificationSink};

#[derive(Clone, Debug)]
pub struct DeliverySettings {
    pub recipient: Option<String>,
    pub format: BodyFormat,
    pub timeout: Duration,
    pub queue_capacity: usize,
}

impl From<&AppConfig> for DeliverySettings {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            recipient: cfg.notify_to.clone(),
            format: cfg.notify_format,
            timeout: cfg.delivery_timeout,
            queue_capacity: cfg.alert_queue_capacity,
        }
    }
}

/// Cheap handle used by the orchestrator to enqueue alerts.
///
/// The worker exits once every handle has been dropped and the queue drained.
#[derive(Clone)]
pub struct AlertDispatcher {
    tx: Sender<AlertEvent>,
    counters: Counters,
}

impl AlertDispatcher {
    /// Starts the delivery worker for `sink`.
    pub fn spawn<N: NotificationSink>(
        sink: Arc<N>,
        settings: DeliverySettings,
        counters: Counters,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(settings.queue_capacity.max(1));

        let worker = DeliveryWorker {
            sink,
            settings,
            counters: counters.clone(),
        };
        let handle = tokio::spawn(worker.run(rx));

        (Self { tx, counters }, handle)
    }

    /// Enqueues `event` for delivery without waiting.
    pub fn dispatch(&self, event: AlertEvent) {
        Counters::incr(&self.counters.alerts_raised);
        info!(
            key = %event.key,
            kind = event.kind.name(),
            subject = %event.subject,
            "alert raised"
        );

        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                Counters::incr(&self.counters.alerts_dropped);
                warn!(subject = %event.subject, "alert queue full; alert dropped");
            }
            Err(TrySendError::Closed(event)) => {
                Counters::incr(&self.counters.alerts_dropped);
                warn!(subject = %event.subject, "delivery worker gone; alert dropped");
            }
        }
    }
}

/// Waits up to `grace` for the delivery worker to flush what is still queued.
///
/// The worker only finishes once every [`AlertDispatcher`] handle is gone.
/// Returns `false` if the grace period ran out first.
pub async fn drain_worker(worker: JoinHandle<()>, grace: Duration) -> bool {
    match tokio::time::timeout(grace, worker).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            warn!(error = %e, "delivery worker ended abnormally");
            true
        }
        Err(_) => {
            warn!(grace_ms = grace.as_millis() as u64, "delivery worker still busy at shutdown");
            false
        }
    }
}

struct DeliveryWorker<N: NotificationSink> {
    sink: Arc<N>,
    settings: DeliverySettings,
    counters: Counters,
}

impl<N: NotificationSink> DeliveryWorker<N> {
    async fn run(self, mut rx: Receiver<AlertEvent>) {
        info!(component = "dispatcher", event = "startup", "Alert delivery worker started");

        while let Some(event) = rx.recv().await {
            let notification = self.render(&event);

            match self.deliver(&notification).await {
                Ok(()) => Counters::incr(&self.counters.deliveries_ok),
                Err(e) => {
                    Counters::incr(&self.counters.deliveries_failed);
                    warn!(
                        key = %event.key,
                        subject = %notification.subject,
                        error = %e,
                        "alert delivery failed"
                    );
                }
            }
        }

        info!(component = "dispatcher", event = "shutdown", "Alert delivery worker exiting");
    }

    fn render(&self, event: &AlertEvent) -> Notification {
        Notification {
            recipient: self.settings.recipient.clone(),
            subject: event.subject.clone(),
            body: MessageBody::render(&event.body, self.settings.format),
        }
    }

    async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError> {
        let timeout = self.settings.timeout;
        match tokio::time::timeout(timeout, self.sink.send(notification)).await {
            Ok(res) => res,
            Err(_) => Err(DeliveryError::Timeout(timeout.as_millis() as u64)),
        }
    }
}
