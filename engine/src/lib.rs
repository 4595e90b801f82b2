//! Trend detection core: per-key window state, the detection pulses, and the
//! keyed state store. Free of I/O; the service crate supplies snapshots and
//! delivers the alerts produced here.

pub mod alert;
pub mod pulse;
pub mod snapshot;
pub mod state;
pub mod store;

pub use alert::{AlertEvent, AlertKind, Direction};
pub use pulse::{PulseSet, Thresholds, transition};
pub use snapshot::{Snapshot, Window, WindowKey, WindowParseError};
pub use state::{Streak, StreakDirection, WindowState};
pub use store::WindowStateStore;
