//! Consecutive-move pulse.
//!
//! Tracks the current run of same-sign changes. Once the run reaches the
//! configured length it alerts on every further tick of the run, not only on
//! the crossing. A change of exactly zero neither extends nor breaks a run.

use super::Pulse;
use crate::alert::{AlertEvent, Direction};
use crate::snapshot::Snapshot;
use crate::state::{StreakDirection, WindowState};

pub struct StreakPulse {
    min_len: usize,
}

impl StreakPulse {
    pub fn new(min_len: usize) -> Self {
        Self {
            min_len: min_len.max(1),
        }
    }
}

impl Pulse for StreakPulse {
    fn name(&self) -> &'static str {
        "streak"
    }

    fn evaluate(&self, snapshot: &Snapshot, state: &mut WindowState) -> Option<AlertEvent> {
        let direction = if snapshot.change_percent > 0.0 {
            StreakDirection::Up
        } else if snapshot.change_percent < 0.0 {
            StreakDirection::Down
        } else {
            return None;
        };

        let streak = &mut state.streak;
        streak.extend(direction, snapshot.clone());

        if streak.len() < self.min_len {
            return None;
        }

        let direction = match streak.direction() {
            StreakDirection::Up => Direction::Up,
            StreakDirection::Down => Direction::Down,
            StreakDirection::None => return None,
        };

        let first = streak.first()?;
        Some(AlertEvent::streak(
            snapshot,
            first,
            direction,
            streak.len(),
            streak.cumulative_percent(),
        ))
    }
}
