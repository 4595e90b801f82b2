//! Volume-surge pulse.
//!
//! Compares quote volume against the previous poll of the same key and fires
//! when growth strictly exceeds the configured percentage.

use super::Pulse;
use crate::alert::AlertEvent;
use crate::snapshot::Snapshot;
use crate::state::WindowState;

pub struct VolumeSurgePulse {
    threshold_pct: f64,
}

impl VolumeSurgePulse {
    pub fn new(threshold_pct: f64) -> Self {
        Self { threshold_pct }
    }
}

/// Percent growth of `current` over `previous`, or `None` without a usable baseline.
pub fn surge_pct(previous: &Snapshot, current: &Snapshot) -> Option<f64> {
    if previous.quote_volume > 0.0 {
        Some((current.quote_volume / previous.quote_volume - 1.0) * 100.0)
    } else {
        None
    }
}

impl Pulse for VolumeSurgePulse {
    fn name(&self) -> &'static str {
        "volume_surge"
    }

    fn evaluate(&self, snapshot: &Snapshot, state: &mut WindowState) -> Option<AlertEvent> {
        let alert = state.last_volume_snapshot.as_ref().and_then(|prev| {
            let surge = surge_pct(prev, snapshot)?;
            (surge > self.threshold_pct).then(|| AlertEvent::volume_surge(snapshot, prev, surge))
        });

        state.last_volume_snapshot = Some(snapshot.clone());
        alert
    }
}
