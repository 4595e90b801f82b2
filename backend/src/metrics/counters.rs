use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Minimal counters for operational visibility.
#[derive(Clone, Default)]
pub struct Counters {
    pub ticks: Arc<AtomicU64>,
    pub evaluations: Arc<AtomicU64>,
    pub fetch_failures: Arc<AtomicU64>,

    pub alerts_raised: Arc<AtomicU64>,
    // queue full or closed
    pub alerts_dropped: Arc<AtomicU64>,

    pub deliveries_ok: Arc<AtomicU64>,
    pub deliveries_failed: Arc<AtomicU64>,
}

/// Point-in-time copy of [`Counters`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CountersSnapshot {
    pub ticks: u64,
    pub evaluations: u64,
    pub fetch_failures: u64,
    pub alerts_raised: u64,
    pub alerts_dropped: u64,
    pub deliveries_ok: u64,
    pub deliveries_failed: u64,
}

impl Counters {
    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CountersSnapshot {
        CountersSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            evaluations: self.evaluations.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            alerts_raised: self.alerts_raised.load(Ordering::Relaxed),
            alerts_dropped: self.alerts_dropped.load(Ordering::Relaxed),
            deliveries_ok: self.deliveries_ok.load(Ordering::Relaxed),
            deliveries_failed: self.deliveries_failed.load(Ordering::Relaxed),
        }
    }
}
