//! Periodic triggers, one per configured window.
//!
//! Each loop awaits its tick before waiting for the next one, and missed
//! ticks are skipped rather than bunched, so a slow tick for a window delays
//! that window's next tick instead of overlapping it.

use std::sync::Arc;
use std::time::Duration;

use engine::Window;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{info, warn};

use crate::market::source::SnapshotSource;
use crate::orchestrator::TickOrchestrator;

/// Spawns the trigger loop for `window`, firing every `every`.
pub fn spawn_window_loop<S: SnapshotSource>(
    orchestrator: Arc<TickOrchestrator<S>>,
    window: Window,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            window = %window,
            every_ms = every.as_millis() as u64,
            "window trigger started"
        );

        loop {
            ticker.tick().await;
            orchestrator.on_tick(window).await;
        }
    })
}

/// Spawns one loop per configured window at the window's own cadence.
pub fn spawn_all<S: SnapshotSource>(orchestrator: Arc<TickOrchestrator<S>>) -> Vec<JoinHandle<()>> {
    orchestrator
        .windows()
        .to_vec()
        .into_iter()
        .map(|w| spawn_window_loop(Arc::clone(&orchestrator), w, w.duration()))
        .collect()
}

/// Aborts the trigger loops and waits until each one has let go of its
/// orchestrator, so the alert dispatcher's queue can close behind them.
pub async fn stop_all(loops: Vec<JoinHandle<()>>) {
    for handle in &loops {
        handle.abort();
    }

    for handle in loops {
        match handle.await {
            Err(e) if e.is_panic() => warn!(error = %e, "window trigger panicked"),
            _ => {}
        }
    }
}
