// In crates/execution/src/error.rs

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("Execution failed: {reason}")]
    ExecutionFailed { reason: String },

    #[error("Insufficient cash: requested {requested}, available {available}")]
    InsufficientCash { requested: Decimal, available: Decimal },

    #[error("No open position to liquidate")]
    NothingToLiquidate,
}

pub type Result<T> = std::result::Result<T, Error>;
