use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use engine::{Thresholds, Window};

use crate::error::ConfigError;
use crate::notify::BodyFormat;

#[derive(Clone, Debug)]
pub struct AppConfig {
    // =========================
    // Tracking
    // =========================
    /// Exchange symbols to watch (e.g. `BTCUSDT`). Upper-cased, deduplicated,
    /// in configuration order.
    pub symbols: Vec<String>,

    /// Windows to poll. Each gets its own periodic trigger.
    pub windows: Vec<Window>,

    /// Alert thresholds per window.
    ///
    /// Every configured window has an entry; per-window variables override
    /// the global ones (e.g. `SURGE_PCT_5M=30`).
    pub thresholds: BTreeMap<Window, Thresholds>,

    // =========================
    // Snapshot source
    // =========================
    /// Base URL of the Binance REST API.
    pub binance_api_url: String,

    /// Upper bound on a single snapshot fetch.
    ///
    /// A fetch that exceeds it is treated as a failure for that key only, so a
    /// stuck request cannot hold the key's state lock into its next tick.
    pub fetch_timeout: Duration,

    // =========================
    // Notifications
    // =========================
    /// Webhook receiving alerts. `None` logs alerts instead of sending them.
    pub notify_webhook_url: Option<String>,

    /// Destination address forwarded with every notification.
    pub notify_to: Option<String>,

    pub notify_format: BodyFormat,

    /// Upper bound on a single delivery attempt.
    pub delivery_timeout: Duration,

    /// Capacity of the queue between rule evaluation and delivery.
    ///
    /// When full, new alerts are dropped (and counted) rather than blocking
    /// evaluation.
    pub alert_queue_capacity: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let symbols = parse_symbols(&var("TRENDWATCH_SYMBOLS").unwrap_or_else(|| "BTCUSDT,ETHUSDT".into()))?;
        let windows = parse_windows(&var("TRENDWATCH_WINDOWS").unwrap_or_else(|| "5m,15m,1h".into()))?;

        let defaults = Thresholds::default();
        let global = Thresholds {
            volume_surge_pct: parse_or(&var, "SURGE_PCT", defaults.volume_surge_pct)?,
            streak_len: parse_or(&var, "STREAK_LEN", defaults.streak_len)?,
            extreme_pct: parse_or(&var, "EXTREME_PCT", defaults.extreme_pct)?,
        };

        let mut thresholds = BTreeMap::new();
        for w in &windows {
            let suffix = window_suffix(*w);
            let t = Thresholds {
                volume_surge_pct: parse_or(&var, &format!("SURGE_PCT_{suffix}"), global.volume_surge_pct)?,
                streak_len: parse_or(&var, &format!("STREAK_LEN_{suffix}"), global.streak_len)?,
                extreme_pct: parse_or(&var, &format!("EXTREME_PCT_{suffix}"), global.extreme_pct)?,
            };
            validate_thresholds(&t, &suffix)?;
            thresholds.insert(*w, t);
        }

        let notify_format = match var("NOTIFY_FORMAT") {
            Some(v) => v
                .parse::<BodyFormat>()
                .map_err(|e| ConfigError::invalid("NOTIFY_FORMAT", &v, e))?,
            None => BodyFormat::Text,
        };

        let alert_queue_capacity: usize = parse_or(&var, "ALERT_QUEUE_CAPACITY", 256)?;
        if alert_queue_capacity == 0 {
            return Err(ConfigError::invalid("ALERT_QUEUE_CAPACITY", "0", "must be positive"));
        }

        let fetch_timeout = positive_secs(&var, "FETCH_TIMEOUT_SECS", 10)?;
        let delivery_timeout = positive_secs(&var, "DELIVERY_TIMEOUT_SECS", 10)?;

        Ok(Self {
            symbols,
            windows,
            thresholds,
            binance_api_url: var("BINANCE_API_URL")
                .unwrap_or_else(|| "https://api.binance.com".into())
                .trim_end_matches('/')
                .to_string(),
            fetch_timeout,
            notify_webhook_url: var("NOTIFY_WEBHOOK_URL"),
            notify_to: var("NOTIFY_TO"),
            notify_format,
            delivery_timeout,
            alert_queue_capacity,
        })
    }

}

fn window_suffix(w: Window) -> String {
    w.as_str().to_ascii_uppercase()
}

fn parse_or<T, F>(var: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match var(name) {
        Some(v) => v.parse::<T>().map_err(|e| ConfigError::invalid(name, &v, e)),
        None => Ok(default),
    }
}

/// A zero timeout would fail every fetch or delivery, so it is rejected.
fn positive_secs<F>(var: &F, name: &str, default: u64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match parse_or(var, name, default)? {
        0 => Err(ConfigError::invalid(name, "0", "must be positive")),
        secs => Ok(Duration::from_secs(secs)),
    }
}

fn parse_symbols(raw: &str) -> Result<Vec<String>, ConfigError> {
    let mut out: Vec<String> = Vec::new();
    for s in raw.split(',').map(|s| s.trim().to_ascii_uppercase()) {
        if s.is_empty() || out.contains(&s) {
            continue;
        }
        if !s.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ConfigError::invalid("TRENDWATCH_SYMBOLS", &s, "symbols are alphanumeric"));
        }
        out.push(s);
    }

    if out.is_empty() {
        return Err(ConfigError::Empty("TRENDWATCH_SYMBOLS"));
    }
    Ok(out)
}

fn parse_windows(raw: &str) -> Result<Vec<Window>, ConfigError> {
    let mut out = Vec::new();
    for part in raw.split(',').filter(|p| !p.trim().is_empty()) {
        let w = part
            .parse::<Window>()
            .map_err(|e| ConfigError::invalid("TRENDWATCH_WINDOWS", part, e))?;
        if !out.contains(&w) {
            out.push(w);
        }
    }

    if out.is_empty() {
        return Err(ConfigError::Empty("TRENDWATCH_WINDOWS"));
    }
    Ok(out)
}

fn validate_thresholds(t: &Thresholds, suffix: &str) -> Result<(), ConfigError> {
    if t.streak_len == 0 {
        return Err(ConfigError::invalid(&format!("STREAK_LEN_{suffix}"), "0", "must be at least 1"));
    }
    if !t.volume_surge_pct.is_finite() {
        return Err(ConfigError::invalid(
            &format!("SURGE_PCT_{suffix}"),
            &t.volume_surge_pct.to_string(),
            "must be finite",
        ));
    }
    if !t.extreme_pct.is_finite() || t.extreme_pct < 0.0 {
        return Err(ConfigError::invalid(
            &format!("EXTREME_PCT_{suffix}"),
            &t.extreme_pct.to_string(),
            "must be a non-negative number",
        ));
    }
    Ok(())
}
