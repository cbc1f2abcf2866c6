// In crates/api-client/src/lib.rs

use app_config::types::BinanceSettings;
use core_types::{Kline, Symbol};
use rust_decimal::Decimal;
use serde_json::Value;

pub mod error;
pub mod price_source;
pub mod types;

// Re-export public types
pub use error::{Error, Result};
pub use price_source::PriceSource;
pub use types::*;

/// Binance caps a single kline request at this many bars.
pub const MAX_KLINES_PER_REQUEST: u16 = 1000;

impl ApiClient {
    /// Constructs a new ApiClient from BinanceSettings.
    pub fn new(settings: &BinanceSettings) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(settings.request_timeout_secs))
            .build()?;
        Ok(ApiClient {
            http_client,
            base_url: settings.rest_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetches the last traded price.
    ///
    /// This corresponds to the `GET /api/v3/ticker/price` endpoint.
    pub async fn get_latest_price(&self, symbol: &Symbol) -> Result<Decimal> {
        let url = format!("{}/api/v3/ticker/price?symbol={}", self.base_url, symbol.0);
        let body = self.get_text(&url).await?;
        let ticker = parse_ticker(&body)?;
        if ticker.price <= Decimal::ZERO {
            return Err(Error::InvalidResponse(format!(
                "non-positive price {} for {}",
                ticker.price, ticker.symbol
            )));
        }
        Ok(ticker.price)
    }

    /// Fetches historical kline (candlestick) data.
    ///
    /// This corresponds to the `GET /api/v3/klines` endpoint.
    ///
    /// # Arguments
    ///
    /// * `symbol`: The symbol to fetch klines for.
    /// * `interval`: The kline interval (e.g., "1m", "1h", "1d").
    /// * `start_time`: Optional start time in milliseconds.
    /// * `end_time`: Optional end time in milliseconds.
    /// * `limit`: Optional number of klines to return (max 1000, default 500).
    pub async fn get_historical_klines(
        &self,
        symbol: &Symbol,
        interval: &str,
        start_time: Option<i64>,
        end_time: Option<i64>,
        limit: Option<u16>,
    ) -> Result<Vec<Kline>> {
        let mut params = format!("symbol={}&interval={}", symbol.0, interval);

        if let Some(st) = start_time {
            params.push_str(&format!("&startTime={}", st));
        }
        if let Some(et) = end_time {
            params.push_str(&format!("&endTime={}", et));
        }
        if let Some(l) = limit {
            params.push_str(&format!("&limit={}", l.min(MAX_KLINES_PER_REQUEST)));
        }

        let url = format!("{}/api/v3/klines?{}", self.base_url, params);
        let body = self.get_text(&url).await?;
        parse_klines(&body)
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        tracing::debug!(url, "GET");
        let response = self.http_client.get(url).send().await?;
        Ok(response.text().await?)
    }
}

// Binance returns an error object on failure, so we check for that first.
fn check_api_error(value: &Value) -> Result<()> {
    if let Some(code) = value.get("code").and_then(Value::as_i64) {
        let msg = value
            .get("msg")
            .and_then(Value::as_str)
            .unwrap_or("Unknown error")
            .to_string();
        return Err(Error::ApiError { code, msg });
    }
    Ok(())
}

fn parse_ticker(body: &str) -> Result<TickerPrice> {
    let value: Value = serde_json::from_str(body)?;
    check_api_error(&value)?;
    Ok(serde_json::from_value(value)?)
}

fn parse_decimal(field: &str, raw: &str) -> Result<Decimal> {
    raw.parse()
        .map_err(|_| Error::InvalidResponse(format!("bad {field} value '{raw}'")))
}

/// Converts a raw klines response body into our clean, internal Kline type.
fn parse_klines(body: &str) -> Result<Vec<Kline>> {
    let value: Value = serde_json::from_str(body)?;
    check_api_error(&value)?;
    let raw_klines: Vec<RawKline> = serde_json::from_value(value)?;

    raw_klines
        .into_iter()
        .map(|raw| {
            Ok(Kline {
                open_time: raw.0,
                open: parse_decimal("open", &raw.1)?,
                high: parse_decimal("high", &raw.2)?,
                low: parse_decimal("low", &raw.3)?,
                close: parse_decimal("close", &raw.4)?,
                volume: parse_decimal("volume", &raw.5)?,
                close_time: raw.6,
            })
        })
        .collect()
}

// Free function to allow api_client::new usage
pub fn new(settings: &BinanceSettings) -> Result<ApiClient> {
    ApiClient::new(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_ticker() {
        let ticker = parse_ticker(r#"{"symbol":"BTCUSDT","price":"64123.45000000"}"#).unwrap();
        assert_eq!(ticker.symbol, "BTCUSDT");
        assert_eq!(ticker.price, dec!(64123.45));
    }

    #[test]
    fn surfaces_binance_error_objects() {
        let err = parse_ticker(r#"{"code":-1121,"msg":"Invalid symbol."}"#).unwrap_err();
        assert!(matches!(err, Error::ApiError { code: -1121, ref msg } if msg == "Invalid symbol."));
    }

    #[test]
    fn parses_kline_arrays() {
        let body = r#"[[1499040000000,"0.01634790","0.80000000","0.01575800","0.01577100","148976.11427815",1499644799999,"2434.19055334",308,"1756.87402397","28.46694368","0"]]"#;
        let klines = parse_klines(body).unwrap();
        assert_eq!(klines.len(), 1);
        assert_eq!(klines[0].open_time, 1499040000000);
        assert_eq!(klines[0].close, dec!(0.015771));
        assert_eq!(klines[0].close_time, 1499644799999);
    }

    #[test]
    fn rejects_garbled_kline_numbers() {
        let body = r#"[[1,"x","1","1","1","1",2,"0",0,"0","0","0"]]"#;
        assert!(matches!(parse_klines(body), Err(Error::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_request_error() {
        let client = ApiClient::new(&BinanceSettings {
            rest_base_url: "http://127.0.0.1:9".into(),
            request_timeout_secs: 1,
        })
        .unwrap();
        let err = client.latest_price(&Symbol("BTCUSDT".into())).await.unwrap_err();
        assert!(matches!(err, Error::RequestFailed(_)));
    }
}
