//! Tick orchestrator.
//!
//! One call to [`TickOrchestrator::on_tick`] evaluates every tracked symbol
//! for one window:
//!
//! Source → transition(state, snapshot) → WindowStateStore → AlertDispatcher
//!
//! Keys are evaluated concurrently. Within a key the state lock is held from
//! before the fetch until the new state is written back, so two overlapping
//! ticks of the same key run strictly one after the other. A fetch failure
//! touches nothing but that key's tick.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use engine::{PulseSet, Thresholds, Window, WindowKey, WindowStateStore, transition};
use futures::future::join_all;
use tracing::{Instrument, debug, info, warn};

use crate::config::AppConfig;
use crate::dispatcher::AlertDispatcher;
use crate::error::FetchError;
use crate::logger::{TraceId, key_span, tick_span, warn_if_slow};
use crate::market::source::SnapshotSource;
use crate::metrics::counters::Counters;

#[derive(Clone, Debug)]
pub struct OrchestratorSettings {
    pub symbols: Vec<String>,
    pub windows: Vec<Window>,
    pub thresholds: BTreeMap<Window, Thresholds>,
    pub fetch_timeout: Duration,
}

impl From<&AppConfig> for OrchestratorSettings {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            symbols: cfg.symbols.clone(),
            windows: cfg.windows.clone(),
            thresholds: cfg.thresholds.clone(),
            fetch_timeout: cfg.fetch_timeout,
        }
    }
}

/// Outcome of one tick across all symbols of a window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickReport {
    pub window: Window,
    pub evaluated: usize,
    pub failed: usize,
    pub alerts: usize,
}

pub struct TickOrchestrator<S: SnapshotSource> {
    source: Arc<S>,
    store: WindowStateStore,
    pulses: BTreeMap<Window, PulseSet>,
    fallback_pulses: PulseSet,
    dispatcher: AlertDispatcher,
    settings: OrchestratorSettings,
    counters: Counters,
}

impl<S: SnapshotSource> TickOrchestrator<S> {
    pub fn new(
        source: Arc<S>,
        dispatcher: AlertDispatcher,
        settings: OrchestratorSettings,
        counters: Counters,
    ) -> Self {
        let keys = settings.windows.iter().flat_map(|w| {
            settings
                .symbols
                .iter()
                .map(move |s| WindowKey::new(s.clone(), *w))
        });
        let store = WindowStateStore::with_keys(keys);

        let pulses = settings
            .windows
            .iter()
            .map(|w| {
                let thresholds = settings.thresholds.get(w).copied().unwrap_or_default();
                (*w, PulseSet::new(thresholds))
            })
            .collect();

        Self {
            source,
            store,
            pulses,
            fallback_pulses: PulseSet::default(),
            dispatcher,
            settings,
            counters,
        }
    }

    pub fn store(&self) -> &WindowStateStore {
        &self.store
    }

    pub fn windows(&self) -> &[Window] {
        &self.settings.windows
    }

    /// Pulses for `window`; windows without configured thresholds use the defaults.
    fn pulses_for(&self, window: Window) -> &PulseSet {
        self.pulses.get(&window).unwrap_or(&self.fallback_pulses)
    }

    /// Runs one tick of `window` for every tracked symbol.
    pub async fn on_tick(&self, window: Window) -> TickReport {
        let trace_id = TraceId::default();

        async {
            Counters::incr(&self.counters.ticks);
            debug!(symbols = self.settings.symbols.len(), "starting tick");

            let outcomes = join_all(
                self.settings
                    .symbols
                    .iter()
                    .map(|symbol| self.evaluate_key(symbol, window)),
            )
            .await;

            let mut report = TickReport {
                window,
                evaluated: 0,
                failed: 0,
                alerts: 0,
            };

            for (symbol, outcome) in self.settings.symbols.iter().zip(outcomes) {
                match outcome {
                    Ok(alerts) => {
                        report.evaluated += 1;
                        report.alerts += alerts;
                    }
                    Err(e) => {
                        report.failed += 1;
                        Counters::incr(&self.counters.fetch_failures);
                        warn!(%symbol, error = %e, "snapshot fetch failed; key skipped this tick");
                    }
                }
            }

            let counters = self.counters.snapshot();
            info!(
                evaluated = report.evaluated,
                failed = report.failed,
                alerts = report.alerts,
                "tick complete"
            );
            debug!(?counters, "counters");

            report
        }
        .instrument(tick_span(window, &trace_id))
        .await
    }

    /// Fetches and evaluates one key. Returns the number of alerts raised.
    ///
    /// On error the key's state is left exactly as it was.
    pub async fn evaluate_key(&self, symbol: &str, window: Window) -> Result<usize, FetchError> {
        let span = key_span(symbol);

        async {
            let key = WindowKey::new(symbol, window);
            let mut state = self.store.lock(&key).await;

            let snapshot = self.fetch(symbol, window).await?;
            tracing::Span::current().record("change_pct", snapshot.change_percent);

            let (next, alerts) = transition(state.clone(), &snapshot, self.pulses_for(window));
            *state = next;
            drop(state);

            Counters::incr(&self.counters.evaluations);

            let count = alerts.len();
            for alert in alerts {
                self.dispatcher.dispatch(alert);
            }

            debug!(alerts = count, "key evaluated");
            Ok(count)
        }
        .instrument(span)
        .await
    }

    async fn fetch(&self, symbol: &str, window: Window) -> Result<engine::Snapshot, FetchError> {
        let limit = self.settings.fetch_timeout;
        let fetch = warn_if_slow("fetch_snapshot", limit / 2, self.source.fetch(symbol, window));

        let snapshot = match tokio::time::timeout(limit, fetch).await {
            Ok(res) => res?,
            Err(_) => return Err(FetchError::Timeout(limit.as_millis() as u64)),
        };

        if snapshot.window != window || !snapshot.symbol.eq_ignore_ascii_case(symbol) {
            return Err(FetchError::Unavailable(format!(
                "source answered {}@{} for {symbol}@{window}",
                snapshot.symbol, snapshot.window
            )));
        }

        Ok(snapshot)
    }
}
