//! Trend detection pulses.
//!
//! A pulse inspects one new snapshot against the key's stored state, updates
//! the part of that state it owns, and optionally raises an alert. Pulses
//! hold configuration only; all per-key memory lives in `WindowState`.

pub mod reversal;
pub mod streak;
pub mod volume;

pub use self::reversal::ReversalPulse;
pub use self::streak::StreakPulse;
pub use self::volume::VolumeSurgePulse;

use crate::alert::AlertEvent;
use crate::snapshot::Snapshot;
use crate::state::WindowState;

/// Per-window alert thresholds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Thresholds {
    /// Volume growth over the previous poll, in percent, that must be exceeded.
    pub volume_surge_pct: f64,

    /// Streak length at which (and beyond which) streak alerts fire.
    pub streak_len: usize,

    /// Absolute percent change above which a reading counts as extreme.
    pub extreme_pct: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            volume_surge_pct: 100.0,
            streak_len: 3,
            extreme_pct: 1.0,
        }
    }
}

pub trait Pulse: Send + Sync {
    fn name(&self) -> &'static str;

    /// Evaluates `snapshot` against `state` and applies this pulse's state update.
    fn evaluate(&self, snapshot: &Snapshot, state: &mut WindowState) -> Option<AlertEvent>;
}

/// The fixed set of pulses run on every tick, in evaluation order.
pub struct PulseSet {
    pulses: Vec<Box<dyn Pulse>>,
}

impl PulseSet {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            pulses: vec![
                Box::new(VolumeSurgePulse::new(thresholds.volume_surge_pct)),
                Box::new(StreakPulse::new(thresholds.streak_len)),
                Box::new(ReversalPulse::new(thresholds.extreme_pct)),
            ],
        }
    }

    pub fn len(&self) -> usize {
        self.pulses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pulses.is_empty()
    }

    /// Runs every pulse against `state` in place.
    pub fn apply(&self, snapshot: &Snapshot, state: &mut WindowState) -> Vec<AlertEvent> {
        let mut alerts = Vec::new();
        for pulse in &self.pulses {
            if let Some(alert) = pulse.evaluate(snapshot, state) {
                tracing::debug!(
                    pulse = pulse.name(),
                    key = %alert.key,
                    subject = %alert.subject,
                    "pulse fired"
                );
                alerts.push(alert);
            }
        }
        alerts
    }
}

impl Default for PulseSet {
    fn default() -> Self {
        Self::new(Thresholds::default())
    }
}

/// State transition for one key: `(snapshot, state) -> (state', alerts)`.
pub fn transition(
    state: WindowState,
    snapshot: &Snapshot,
    pulses: &PulseSet,
) -> (WindowState, Vec<AlertEvent>) {
    let mut next = state;
    let alerts = pulses.apply(snapshot, &mut next);
    (next, alerts)
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{TimeZone, Utc};

    use crate::snapshot::{Snapshot, Window};

    pub fn snap(change: f64, price: f64, volume: f64) -> Snapshot {
        Snapshot {
            symbol: "X".into(),
            window: Window::FifteenMinutes,
            change_percent: change,
            last_price: price,
            open_price: price,
            quote_volume: volume,
            timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        }
    }

    pub fn change(change: f64) -> Snapshot {
        snap(change, 100.0, 1_000.0)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::test_support::*;
    use super::*;
    use crate::alert::{AlertKind, Direction};

    fn run(changes: &[f64]) -> (WindowState, Vec<Vec<AlertEvent>>) {
        let pulses = PulseSet::default();
        let mut state = WindowState::default();
        let mut per_tick = Vec::new();
        for c in changes {
            let (next, alerts) = transition(state, &change(*c), &pulses);
            state = next;
            per_tick.push(alerts);
        }
        (state, per_tick)
    }

    fn streak_alerts(alerts: &[AlertEvent]) -> Vec<&AlertEvent> {
        alerts
            .iter()
            .filter(|a| matches!(a.kind, AlertKind::Streak { .. }))
            .collect()
    }

    #[test]
    fn up_run_alerts_on_third_tick_with_cumulative_sum() {
        let (_, ticks) = run(&[2.0, 1.5, 3.0]);

        assert!(streak_alerts(&ticks[0]).is_empty());
        assert!(streak_alerts(&ticks[1]).is_empty());

        let third = streak_alerts(&ticks[2]);
        assert_eq!(third.len(), 1);
        match third[0].kind {
            AlertKind::Streak {
                direction,
                length,
                cumulative_pct,
            } => {
                assert_eq!(direction, Direction::Up);
                assert_eq!(length, 3);
                assert!((cumulative_pct - 6.5).abs() < 1e-9);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn cleared_extreme_memory_suppresses_reversal() {
        let (state, ticks) = run(&[1.5, 0.2, -1.8]);

        for alerts in &ticks {
            assert!(
                !alerts.iter().any(|a| matches!(
                    a.kind,
                    AlertKind::Reversal { .. } | AlertKind::Continuation { .. }
                ))
            );
        }
        assert_eq!(
            state.last_extreme_snapshot.map(|s| s.change_percent),
            Some(-1.8)
        );
    }

    #[test]
    fn one_tick_can_raise_several_alerts() {
        let pulses = PulseSet::default();
        assert_eq!(pulses.len(), 3);

        let mut state = WindowState::default();
        for (c, v) in [(1.2, 1_000.0), (1.1, 1_000.0)] {
            let (next, _) = transition(state, &snap(c, 100.0, v), &pulses);
            state = next;
        }

        let (_, alerts) = transition(state, &snap(2.0, 104.0, 5_000.0), &pulses);
        let names: Vec<_> = alerts.iter().map(|a| a.kind.name()).collect();
        assert_eq!(names, vec!["volume_surge", "streak", "continuation"]);
    }

    #[test]
    fn same_side_extreme_after_cleared_memory_is_not_a_continuation() {
        for seq in [[1.5, 0.2, 1.8], [-1.5, 0.3, -2.0]] {
            let (state, ticks) = run(&seq);
            assert!(
                ticks.iter().flatten().all(|a| !matches!(
                    a.kind,
                    AlertKind::Continuation { .. } | AlertKind::Reversal { .. }
                )),
                "pin alert for {seq:?}"
            );
            assert_eq!(
                state.last_extreme_snapshot.map(|s| s.change_percent),
                Some(seq[2])
            );
        }
    }

    #[test]
    fn thresholds_reach_every_pulse() {
        let pulses = PulseSet::new(Thresholds {
            volume_surge_pct: 20.0,
            streak_len: 2,
            extreme_pct: 0.5,
        });

        let mut state = WindowState::default();
        let (next, first) = transition(state, &snap(0.6, 100.0, 1_000.0), &pulses);
        state = next;
        assert!(first.is_empty());

        let (_, alerts) = transition(state, &snap(0.7, 101.0, 1_300.0), &pulses);
        let names: Vec<_> = alerts.iter().map(|a| a.kind.name()).collect();
        assert_eq!(names, vec!["volume_surge", "streak", "continuation"]);
    }

    #[test]
    fn volume_and_extreme_slots_are_independent() {
        let (state, _) = run(&[1.5, 0.2]);
        assert!(state.last_extreme_snapshot.is_none());
        assert_eq!(
            state.last_volume_snapshot.map(|s| s.change_percent),
            Some(0.2)
        );
    }

    fn nonzero() -> impl Strategy<Value = f64> {
        prop_oneof![0.01f64..10.0, -10.0f64..-0.01]
    }

    proptest! {
        #[test]
        fn alternating_signs_never_build_a_streak(first in nonzero(), mags in prop::collection::vec(0.01f64..10.0, 1..40)) {
            let pulses = PulseSet::default();
            let mut state = WindowState::default();
            let mut sign = first.signum();
            for m in mags {
                let (next, alerts) = transition(state, &change(sign * m), &pulses);
                state = next;
                prop_assert!(state.streak.len() <= 1);
                prop_assert!(streak_alerts(&alerts).is_empty());
                sign = -sign;
            }
        }

        #[test]
        fn monotonic_run_alerts_from_third_tick(mags in prop::collection::vec(0.01f64..10.0, 3..30), down in any::<bool>()) {
            let sign = if down { -1.0 } else { 1.0 };
            let pulses = PulseSet::default();
            let mut state = WindowState::default();
            let mut sum = 0.0;
            for (i, m) in mags.iter().enumerate() {
                sum += sign * m;
                let (next, alerts) = transition(state, &change(sign * m), &pulses);
                state = next;
                let fired = streak_alerts(&alerts);
                if i + 1 >= 3 {
                    prop_assert_eq!(fired.len(), 1);
                    if let AlertKind::Streak { length, cumulative_pct, .. } = fired[0].kind {
                        prop_assert_eq!(length, i + 1);
                        prop_assert!((cumulative_pct - sum).abs() < 1e-9);
                    }
                } else {
                    prop_assert!(fired.is_empty());
                }
            }
        }

        #[test]
        fn zero_change_is_streak_neutral(changes in prop::collection::vec(nonzero(), 0..20)) {
            let (before, _) = run(&changes);
            let (after, _) = transition(before.clone(), &change(0.0), &PulseSet::default());
            prop_assert_eq!(after.streak, before.streak);
        }

        #[test]
        fn non_extreme_tick_forgets_the_previous_extreme(
            first in 1.01f64..10.0,
            middle in -1.0f64..=1.0,
            last in 1.01f64..10.0,
            down in any::<bool>(),
            flip in any::<bool>(),
        ) {
            let sign = if down { -1.0 } else { 1.0 };
            let last_sign = if flip { -sign } else { sign };
            let (_, ticks) = run(&[sign * first, middle, last_sign * last]);

            let pin = ticks.iter().flatten().find(|a| matches!(
                a.kind,
                AlertKind::Continuation { .. } | AlertKind::Reversal { .. }
            ));
            prop_assert!(pin.is_none(), "unexpected {:?}", pin.map(|a| &a.subject));
        }
    }
}
