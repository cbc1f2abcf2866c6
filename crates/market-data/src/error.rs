// In crates/market-data/src/error.rs

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Price series is empty")]
    EmptySeries,

    #[error("Row {row}: unparseable date '{value}'")]
    InvalidDate { row: usize, value: String },

    #[error("Row {row}: close price must be positive, got {close}")]
    NonPositivePrice { row: usize, close: Decimal },

    #[error("Row {row}: timestamp {current} is not after previous timestamp {previous}")]
    NonMonotonic { row: usize, previous: i64, current: i64 },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to read or write file: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
