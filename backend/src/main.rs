use std::sync::Arc;
use std::time::Duration;

use backend::{
    config::AppConfig,
    dispatcher::{self, AlertDispatcher, DeliverySettings},
    logger::init_tracing,
    market::binance::BinanceClient,
    metrics::counters::Counters,
    notify::{LogSink, NotificationSink, WebhookSink},
    orchestrator::{OrchestratorSettings, TickOrchestrator},
    scheduler,
};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Wires the source, sink and orchestrator together and runs the window
/// triggers until Ctrl-C.
async fn run<N: NotificationSink>(cfg: AppConfig, sink: Arc<N>) -> anyhow::Result<()> {
    let counters = Counters::default();

    let source = Arc::new(BinanceClient::new(
        cfg.binance_api_url.clone(),
        cfg.fetch_timeout,
    )?);

    let (alerts, delivery) =
        AlertDispatcher::spawn(sink, DeliverySettings::from(&cfg), counters.clone());

    let orchestrator = Arc::new(TickOrchestrator::new(
        source,
        alerts,
        OrchestratorSettings::from(&cfg),
        counters,
    ));

    let loops = scheduler::spawn_all(orchestrator);

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    // The loops own the last orchestrator handles, and with them the dispatcher.
    scheduler::stop_all(loops).await;
    if dispatcher::drain_worker(delivery, SHUTDOWN_GRACE).await {
        tracing::info!("pending alerts flushed");
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let is_production = std::env::var("APP_ENV").unwrap_or_default() == "production";
    init_tracing(is_production);

    tracing::info!("Starting trendwatch...");

    let cfg = AppConfig::from_env()?;

    tracing::info!(
        symbols = ?cfg.symbols,
        windows = ?cfg.windows,
        webhook = cfg.notify_webhook_url.is_some(),
        "configuration loaded"
    );

    match cfg.notify_webhook_url.clone() {
        Some(url) => {
            let sink = Arc::new(WebhookSink::new(url, cfg.delivery_timeout)?);
            run(cfg, sink).await
        }
        None => {
            tracing::warn!("NOTIFY_WEBHOOK_URL not set; alerts will only be logged");
            run(cfg, Arc::new(LogSink)).await
        }
    }
}
