// In crates/analytics/src/types.rs

use core_types::TradeRecord;
use rust_decimal::Decimal;
use serde::Serialize;

/// End-of-run summary of a single simulation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub initial_cash: Decimal,
    pub final_value: Decimal,
    pub net_profit: Decimal,
    pub trade_count: usize,
    /// Terminal cash balance.
    pub cash: Decimal,
    /// Terminal asset balance.
    pub asset_quantity: Decimal,
    pub trades: Vec<TradeRecord>,
}

/// Outcome of one window of a rolling or Monte Carlo batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowResult {
    /// Index of the first bar of the window in the full series.
    pub start_index: usize,
    pub start: i64,
    pub end: i64,
    pub profit: Decimal,
    pub final_value: Decimal,
    pub trades: Vec<TradeRecord>,
}

/// Summary statistics over the profits of many runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfitDistribution {
    pub samples: usize,
    pub total: Decimal,
    pub mean: Decimal,
    pub median: Decimal,
    /// Percentage of runs with a strictly positive profit.
    pub win_rate_pct: Decimal,
    pub worst: Decimal,
    pub best: Decimal,
}
