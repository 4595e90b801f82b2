use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use engine::{Snapshot, Window};
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument};

use crate::error::FetchError;
use crate::market::binance::types::{ApiErrorBody, INVALID_SYMBOL, RollingTicker};
use crate::market::source::SnapshotSource;

#[derive(Clone)]
pub struct BinanceClient {
    http: Client,
    url: String,
}

impl BinanceClient {
    pub fn new(url: String, timeout: Duration) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        Ok(Self { http, url })
    }

    #[instrument(skip(self, window), fields(window = %window), level = "debug")]
    pub async fn fetch_ticker(&self, symbol: &str, window: Window) -> Result<RollingTicker, FetchError> {
        let url = format!("{}/api/v3/ticker", self.url);

        let resp = self
            .http
            .get(&url)
            .query(&[("symbol", symbol), ("windowSize", window.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(classify_failure(symbol, status, &body));
        }

        let ticker: RollingTicker = resp
            .json()
            .await
            .map_err(|e| FetchError::Unavailable(format!("invalid ticker response: {e}")))?;

        debug!(
            change_pct = %ticker.price_change_percent,
            last_price = %ticker.last_price,
            quote_volume = %ticker.quote_volume,
            "binance ticker fetched"
        );

        Ok(ticker)
    }
}

#[async_trait]
impl SnapshotSource for BinanceClient {
    async fn fetch(&self, symbol: &str, window: Window) -> Result<Snapshot, FetchError> {
        let polled_at = Utc::now();
        self.fetch_ticker(symbol, window)
            .await?
            .into_snapshot(window, polled_at)
    }
}

/// Maps a non-success response to the fetch error taxonomy.
pub fn classify_failure(symbol: &str, status: StatusCode, body: &str) -> FetchError {
    if status == StatusCode::NOT_FOUND {
        return FetchError::NotFound(symbol.to_string());
    }

    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(err) if err.code == INVALID_SYMBOL => FetchError::NotFound(symbol.to_string()),
        Ok(err) => FetchError::Unavailable(format!("{status}: {} ({})", err.msg, err.code)),
        Err(_) => FetchError::Unavailable(format!("{status}: {body}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_symbol_is_not_found() {
        let e = classify_failure(
            "NOPEUSDT",
            StatusCode::BAD_REQUEST,
            r#"{"code":-1121,"msg":"Invalid symbol."}"#,
        );
        assert!(matches!(e, FetchError::NotFound(s) if s == "NOPEUSDT"));
    }

    #[test]
    fn rate_limit_is_unavailable() {
        let e = classify_failure(
            "BTCUSDT",
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"code":-1003,"msg":"Too many requests."}"#,
        );
        assert!(matches!(e, FetchError::Unavailable(_)));
    }

    #[test]
    fn opaque_server_error_is_unavailable() {
        let e = classify_failure("BTCUSDT", StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert!(matches!(e, FetchError::Unavailable(msg) if msg.contains("502")));
    }
}
