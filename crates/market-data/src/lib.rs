// In crates/market-data/src/lib.rs

//! Price series storage: the historical data a backtest runs on lives in
//! plain `date,open,high,low,close,volume` CSV files.

use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};
use core_types::{format_timestamp, Kline, TradeRecord};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod error;

pub use error::{Error, Result};

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

#[derive(Debug, Deserialize, Serialize)]
struct CsvBar {
    date: String,
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
    volume: Decimal,
}

#[derive(Debug, Serialize)]
struct CsvTrade<'a> {
    date: String,
    action: &'a str,
    price: Decimal,
    quantity: Decimal,
}

/// Parses a UTC date or datetime into epoch milliseconds.
pub fn parse_date(value: &str) -> Option<i64> {
    let value = value.trim();
    for format in DATE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(Utc.from_utc_datetime(&naive).timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive).timestamp_millis())
}

/// Loads and validates a price series. The series is never re-sorted: rows
/// must already be in strictly ascending date order.
pub fn load_klines(path: impl AsRef<Path>) -> Result<Vec<Kline>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)?;
    let mut klines = Vec::new();

    for (i, record) in reader.deserialize::<CsvBar>().enumerate() {
        let row = i + 1;
        let bar = record?;
        let open_time = parse_date(&bar.date).ok_or_else(|| Error::InvalidDate {
            row,
            value: bar.date.clone(),
        })?;
        klines.push(Kline {
            open_time,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            close_time: open_time,
        });
    }

    validate_series(&klines)?;
    tracing::info!(path = %path.display(), count = klines.len(), "Loaded price series.");
    Ok(klines)
}

/// Checks that a series is non-empty, strictly ascending and positively priced.
pub fn validate_series(klines: &[Kline]) -> Result<()> {
    if klines.is_empty() {
        return Err(Error::EmptySeries);
    }
    let mut previous: Option<i64> = None;
    for (i, kline) in klines.iter().enumerate() {
        let row = i + 1;
        if kline.close <= Decimal::ZERO {
            return Err(Error::NonPositivePrice { row, close: kline.close });
        }
        if let Some(prev) = previous {
            if kline.open_time <= prev {
                return Err(Error::NonMonotonic {
                    row,
                    previous: prev,
                    current: kline.open_time,
                });
            }
        }
        previous = Some(kline.open_time);
    }
    Ok(())
}

/// Writes a price series in the same format `load_klines` reads.
pub fn save_klines(path: impl AsRef<Path>, klines: &[Kline]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    for k in klines {
        writer.serialize(CsvBar {
            date: format_timestamp(k.open_time),
            open: k.open,
            high: k.high,
            low: k.low,
            close: k.close,
            volume: k.volume,
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Exports a trade log for external charting.
pub fn save_trades(path: impl AsRef<Path>, trades: &[TradeRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    for t in trades {
        writer.serialize(CsvTrade {
            date: format_timestamp(t.timestamp),
            action: t.action.as_str(),
            price: t.price,
            quantity: t.quantity,
        })?;
    }
    writer.flush()?;
    Ok(())
}
