use chrono::{DateTime, Utc};
use engine::{Snapshot, Window};
use serde::Deserialize;

use crate::error::FetchError;

/// Binance error code for an unknown symbol.
pub const INVALID_SYMBOL: i64 = -1121;

/// Rolling-window ticker (`GET /api/v3/ticker?windowSize=..`).
///
/// Only the fields the detector needs; numeric values arrive as strings.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollingTicker {
    pub symbol: String,
    pub price_change_percent: String,
    pub last_price: String,
    pub open_price: String,
    pub quote_volume: String,
    #[serde(default)]
    pub close_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub code: i64,
    pub msg: String,
}

impl RollingTicker {
    pub fn into_snapshot(self, window: Window, polled_at: DateTime<Utc>) -> Result<Snapshot, FetchError> {
        let change_percent = parse_field("priceChangePercent", &self.price_change_percent)?;
        let last_price = parse_non_negative("lastPrice", &self.last_price)?;
        let open_price = parse_non_negative("openPrice", &self.open_price)?;
        let quote_volume = parse_non_negative("quoteVolume", &self.quote_volume)?;

        Ok(Snapshot {
            symbol: self.symbol,
            window,
            change_percent,
            last_price,
            open_price,
            quote_volume,
            timestamp: polled_at,
        })
    }
}

fn parse_field(name: &str, raw: &str) -> Result<f64, FetchError> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| FetchError::Unavailable(format!("bad {name}: `{raw}`")))
}

fn parse_non_negative(name: &str, raw: &str) -> Result<f64, FetchError> {
    let v = parse_field(name, raw)?;
    if v < 0.0 {
        return Err(FetchError::Unavailable(format!("negative {name}: `{raw}`")));
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICKER: &str = r#"{
        "symbol": "BTCUSDT",
        "priceChange": "1300.00000000",
        "priceChangePercent": "2.037",
        "weightedAvgPrice": "64500.12000000",
        "openPrice": "63800.00000000",
        "highPrice": "65200.00000000",
        "lowPrice": "63700.00000000",
        "lastPrice": "65100.00000000",
        "volume": "812.33000000",
        "quoteVolume": "52395810.44000000",
        "openTime": 1700000000000,
        "closeTime": 1700000900000,
        "firstId": 1,
        "lastId": 2,
        "count": 2
    }"#;

    #[test]
    fn decodes_rolling_ticker_into_snapshot() {
        let t: RollingTicker = serde_json::from_str(TICKER).unwrap();
        let now = Utc::now();
        let s = t.into_snapshot(Window::FifteenMinutes, now).unwrap();

        assert_eq!(s.symbol, "BTCUSDT");
        assert_eq!(s.window, Window::FifteenMinutes);
        assert!((s.change_percent - 2.037).abs() < 1e-12);
        assert_eq!(s.last_price, 65_100.0);
        assert_eq!(s.open_price, 63_800.0);
        assert!((s.quote_volume - 52_395_810.44).abs() < 1e-6);
        assert_eq!(s.timestamp, now);
    }

    #[test]
    fn rejects_garbage_numbers() {
        let t = RollingTicker {
            symbol: "X".into(),
            price_change_percent: "n/a".into(),
            last_price: "1".into(),
            open_price: "1".into(),
            quote_volume: "1".into(),
            close_time: None,
        };
        assert!(matches!(
            t.into_snapshot(Window::OneHour, Utc::now()),
            Err(FetchError::Unavailable(_))
        ));
    }

    #[test]
    fn rejects_negative_volume() {
        let t = RollingTicker {
            symbol: "X".into(),
            price_change_percent: "-0.5".into(),
            last_price: "1".into(),
            open_price: "1".into(),
            quote_volume: "-3".into(),
            close_time: None,
        };
        assert!(t.into_snapshot(Window::OneHour, Utc::now()).is_err());
    }
}
