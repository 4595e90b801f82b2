//! Reversal ("pin") pulse.
//!
//! Compares an extreme reading against the most recent stored extreme. Memory
//! only survives across consecutive extremes: any non-extreme tick clears it.

use super::Pulse;
use crate::alert::{AlertEvent, Direction};
use crate::snapshot::Snapshot;
use crate::state::WindowState;

pub struct ReversalPulse {
    extreme_pct: f64,
}

impl ReversalPulse {
    pub fn new(extreme_pct: f64) -> Self {
        Self { extreme_pct }
    }

    fn classify(&self, change_percent: f64) -> Option<Direction> {
        if change_percent > self.extreme_pct {
            Some(Direction::Up)
        } else if change_percent < -self.extreme_pct {
            Some(Direction::Down)
        } else {
            None
        }
    }
}

impl Pulse for ReversalPulse {
    fn name(&self) -> &'static str {
        "reversal"
    }

    fn evaluate(&self, snapshot: &Snapshot, state: &mut WindowState) -> Option<AlertEvent> {
        let Some(current) = self.classify(snapshot.change_percent) else {
            state.last_extreme_snapshot = None;
            return None;
        };

        let alert = state.last_extreme_snapshot.as_ref().and_then(|stored| {
            let previous = self.classify(stored.change_percent)?;
            Some(if previous == current {
                AlertEvent::continuation(snapshot, stored, current)
            } else {
                AlertEvent::reversal(snapshot, stored, current)
            })
        });

        state.last_extreme_snapshot = Some(snapshot.clone());
        alert
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::AlertKind;
    use crate::pulse::test_support::change;

    fn feed(changes: &[f64]) -> (WindowState, Vec<Option<AlertKind>>) {
        let pulse = ReversalPulse::new(1.0);
        let mut state = WindowState::default();
        let kinds = changes
            .iter()
            .map(|c| pulse.evaluate(&change(*c), &mut state).map(|a| a.kind))
            .collect();
        (state, kinds)
    }

    #[test]
    fn down_pin_then_spike_is_a_reversal() {
        let (_, kinds) = feed(&[-1.6, 2.1]);
        assert_eq!(kinds[0], None);
        assert_eq!(
            kinds[1],
            Some(AlertKind::Reversal {
                direction: Direction::Up
            })
        );
    }

    #[test]
    fn up_pin_then_plunge_is_a_reversal() {
        let (_, kinds) = feed(&[1.2, -3.0]);
        assert_eq!(
            kinds[1],
            Some(AlertKind::Reversal {
                direction: Direction::Down
            })
        );
    }

    #[test]
    fn same_side_extremes_are_continuations() {
        let (_, kinds) = feed(&[1.5, 1.01, -1.1, -2.0]);
        assert_eq!(
            kinds[1],
            Some(AlertKind::Continuation {
                direction: Direction::Up
            })
        );
        assert_eq!(
            kinds[2],
            Some(AlertKind::Reversal {
                direction: Direction::Down
            })
        );
        assert_eq!(
            kinds[3],
            Some(AlertKind::Continuation {
                direction: Direction::Down
            })
        );
    }

    #[test]
    fn non_extreme_tick_erases_memory() {
        let (state, kinds) = feed(&[1.5, 0.2, -1.8]);
        assert!(kinds.iter().all(Option::is_none));
        assert_eq!(
            state.last_extreme_snapshot.map(|s| s.change_percent),
            Some(-1.8)
        );
    }

    #[test]
    fn boundary_value_is_not_extreme() {
        let (state, kinds) = feed(&[1.5, 1.0]);
        assert!(kinds[1].is_none());
        assert!(state.last_extreme_snapshot.is_none());
    }
}
