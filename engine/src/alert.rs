//! Alert events and their human-readable rendering.

use std::fmt;

use crate::snapshot::{Snapshot, WindowKey};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn arrow(&self) -> &'static str {
        match self {
            Direction::Up => "↑",
            Direction::Down => "↓",
        }
    }
}

/// What a rule detected, with the numbers it detected it from.
#[derive(Clone, Debug, PartialEq)]
pub enum AlertKind {
    VolumeSurge {
        surge_pct: f64,
    },
    Streak {
        direction: Direction,
        length: usize,
        cumulative_pct: f64,
    },
    /// A strong move in the same direction as the stored extreme.
    Continuation {
        direction: Direction,
    },
    /// A strong move against the stored extreme (a pin).
    Reversal {
        direction: Direction,
    },
}

impl AlertKind {
    pub fn name(&self) -> &'static str {
        match self {
            AlertKind::VolumeSurge { .. } => "volume_surge",
            AlertKind::Streak { .. } => "streak",
            AlertKind::Continuation { .. } => "continuation",
            AlertKind::Reversal { .. } => "reversal",
        }
    }
}

/// Ephemeral alert produced by a rule and handed straight to the dispatcher.
#[derive(Clone, Debug, PartialEq)]
pub struct AlertEvent {
    pub key: WindowKey,
    pub kind: AlertKind,
    pub subject: String,
    pub body: String,
}

impl fmt::Display for AlertEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.body)
    }
}

impl AlertEvent {
    pub fn volume_surge(current: &Snapshot, previous: &Snapshot, surge_pct: f64) -> Self {
        let subject = format!(
            "{} volume surge {}",
            prefix(current),
            signed_pct(surge_pct, 1)
        );
        let body = format!(
            "{}\nquote volume {} (previous {})",
            price_summary(current),
            fmt_number(current.quote_volume),
            fmt_number(previous.quote_volume),
        );

        Self {
            key: current.key(),
            kind: AlertKind::VolumeSurge { surge_pct },
            subject,
            body,
        }
    }

    pub fn streak(
        current: &Snapshot,
        first: &Snapshot,
        direction: Direction,
        length: usize,
        cumulative_pct: f64,
    ) -> Self {
        let (noun, verb) = match direction {
            Direction::Up => ("rise", "rose"),
            Direction::Down => ("decline", "fell"),
        };

        let subject = format!(
            "{} continuous {noun} for {length} windows",
            prefix(current)
        );
        let body = format!(
            "price {verb} from {} to {}, total {}",
            fmt_number(first.last_price),
            fmt_number(current.last_price),
            signed_pct(cumulative_pct, 2),
        );

        Self {
            key: current.key(),
            kind: AlertKind::Streak {
                direction,
                length,
                cumulative_pct,
            },
            subject,
            body,
        }
    }

    pub fn continuation(current: &Snapshot, stored: &Snapshot, direction: Direction) -> Self {
        let what = match direction {
            Direction::Up => "continuation of strong upward move",
            Direction::Down => "continuation of strong downward move",
        };

        Self {
            key: current.key(),
            kind: AlertKind::Continuation { direction },
            subject: format!("{} {what}", prefix(current)),
            body: extreme_pair_summary(current, stored),
        }
    }

    pub fn reversal(current: &Snapshot, stored: &Snapshot, direction: Direction) -> Self {
        let what = match direction {
            Direction::Up => "reversal: down-pin followed by spike up",
            Direction::Down => "reversal: up-pin followed by plunge down",
        };

        Self {
            key: current.key(),
            kind: AlertKind::Reversal { direction },
            subject: format!("{} {what}", prefix(current)),
            body: extreme_pair_summary(current, stored),
        }
    }
}

fn prefix(s: &Snapshot) -> String {
    format!("[{} {}]", s.symbol, s.window)
}

fn price_summary(s: &Snapshot) -> String {
    let arrow = if s.change_percent >= 0.0 {
        Direction::Up.arrow()
    } else {
        Direction::Down.arrow()
    };
    format!(
        "price {} {arrow} {}",
        fmt_number(s.last_price),
        signed_pct(s.change_percent, 1)
    )
}

fn extreme_pair_summary(current: &Snapshot, stored: &Snapshot) -> String {
    format!(
        "{}\nprevious window {}",
        price_summary(current),
        signed_pct(stored.change_percent, 1)
    )
}

/// `+1.5%` / `-0.3%` with a fixed number of decimals.
pub fn signed_pct(v: f64, decimals: usize) -> String {
    format!("{v:+.decimals$}%")
}

/// Prints prices and volumes without trailing zero noise, keeping enough
/// precision for sub-cent assets.
pub fn fmt_number(v: f64) -> String {
    let s = format!("{v:.8}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s.is_empty() || s == "-" {
        "0".to_string()
    } else {
        s.to_string()
    }
}
