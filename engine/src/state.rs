//! Per-key bookkeeping carried between polls.

use crate::snapshot::Snapshot;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StreakDirection {
    #[default]
    None,
    Up,
    Down,
}

/// Run of consecutive same-direction snapshots, oldest first.
///
/// The streak length is the history length, so the two can never disagree.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Streak {
    direction: StreakDirection,
    history: Vec<Snapshot>,
}

impl Streak {
    pub fn direction(&self) -> StreakDirection {
        self.direction
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn history(&self) -> &[Snapshot] {
        &self.history
    }

    /// Extends the streak in `direction`, restarting it first if the
    /// direction flipped.
    pub fn extend(&mut self, direction: StreakDirection, snapshot: Snapshot) {
        if self.direction != direction {
            self.reset();
            self.direction = direction;
        }
        self.history.push(snapshot);
    }

    pub fn reset(&mut self) {
        self.direction = StreakDirection::None;
        self.history.clear();
    }

    /// Sum of `change_percent` over the whole run.
    pub fn cumulative_percent(&self) -> f64 {
        self.history.iter().map(|s| s.change_percent).sum()
    }

    pub fn first(&self) -> Option<&Snapshot> {
        self.history.first()
    }
}

/// Mutable state owned by exactly one `WindowKey`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WindowState {
    /// Baseline for the volume-surge comparison. Replaced on every tick.
    pub last_volume_snapshot: Option<Snapshot>,

    /// Most recent extreme reading. Cleared by any non-extreme tick.
    pub last_extreme_snapshot: Option<Snapshot>,

    pub streak: Streak,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Window;
    use chrono::Utc;

    fn snap(change: f64) -> Snapshot {
        Snapshot {
            symbol: "X".into(),
            window: Window::FiveMinutes,
            change_percent: change,
            last_price: 100.0,
            open_price: 100.0,
            quote_volume: 1_000.0,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn direction_flip_restarts_history() {
        let mut s = Streak::default();
        s.extend(StreakDirection::Up, snap(1.0));
        s.extend(StreakDirection::Up, snap(2.0));
        assert_eq!(s.len(), 2);

        s.extend(StreakDirection::Down, snap(-0.5));
        assert_eq!(s.direction(), StreakDirection::Down);
        assert_eq!(s.len(), 1);
        assert_eq!(s.cumulative_percent(), -0.5);
    }

    #[test]
    fn reset_clears_direction_and_history() {
        let mut s = Streak::default();
        s.extend(StreakDirection::Down, snap(-1.0));
        s.reset();
        assert!(s.is_empty());
        assert_eq!(s.direction(), StreakDirection::None);
    }
}
