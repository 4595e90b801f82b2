use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fixed aggregation bucket a snapshot was computed over.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Window {
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "1h")]
    OneHour,
}

impl Window {
    pub const ALL: [Window; 3] = [Window::FiveMinutes, Window::FifteenMinutes, Window::OneHour];

    /// Short label, also the `windowSize` value understood by the exchange.
    pub fn as_str(&self) -> &'static str {
        match self {
            Window::FiveMinutes => "5m",
            Window::FifteenMinutes => "15m",
            Window::OneHour => "1h",
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            Window::FiveMinutes => Duration::from_secs(5 * 60),
            Window::FifteenMinutes => Duration::from_secs(15 * 60),
            Window::OneHour => Duration::from_secs(60 * 60),
        }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown window `{0}` (expected 5m, 15m or 1h)")]
pub struct WindowParseError(pub String);

impl FromStr for Window {
    type Err = WindowParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "5m" => Ok(Window::FiveMinutes),
            "15m" => Ok(Window::FifteenMinutes),
            "1h" | "60m" => Ok(Window::OneHour),
            other => Err(WindowParseError(other.to_string())),
        }
    }
}

/// One polled price/volume reading for a symbol over a window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub symbol: String,
    pub window: Window,

    /// Signed percentage change over the window (2.5 means +2.5%).
    pub change_percent: f64,

    pub last_price: f64,
    pub open_price: f64,

    /// Traded volume in quote currency over the window.
    pub quote_volume: f64,

    /// Poll time.
    pub timestamp: DateTime<Utc>,
}

impl Snapshot {
    pub fn key(&self) -> WindowKey {
        WindowKey::new(self.symbol.clone(), self.window)
    }
}

/// Identifies one independent state machine: a symbol polled on one window.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowKey {
    pub symbol: String,
    pub window: Window,
}

impl WindowKey {
    pub fn new(symbol: impl Into<String>, window: Window) -> Self {
        Self {
            symbol: symbol.into(),
            window,
        }
    }
}

impl fmt::Display for WindowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.symbol, self.window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_window_labels() {
        assert_eq!("5m".parse::<Window>().unwrap(), Window::FiveMinutes);
        assert_eq!(" 15M ".parse::<Window>().unwrap(), Window::FifteenMinutes);
        assert_eq!("1h".parse::<Window>().unwrap(), Window::OneHour);
        assert!("4h".parse::<Window>().is_err());
    }

    #[test]
    fn window_durations() {
        assert_eq!(Window::FiveMinutes.duration().as_secs(), 300);
        assert_eq!(Window::OneHour.duration().as_secs(), 3_600);
    }

    #[test]
    fn key_display_is_symbol_at_window() {
        let key = WindowKey::new("BTCUSDT", Window::FifteenMinutes);
        assert_eq!(key.to_string(), "BTCUSDT@15m");
    }
}
