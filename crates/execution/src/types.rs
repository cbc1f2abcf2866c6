// In crates/execution/src/types.rs

use core_types::{TradeAction, TradeRecord};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{Error, Result};

/// The cash and asset movement produced by a single ledger operation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Fill {
    pub price: Decimal,
    pub quantity: Decimal,
    /// Cash spent on a buy, or received from a liquidation.
    pub notional: Decimal,
}

/// Cash, asset balance and trade log of one simulation run.
///
/// The ledger only moves balances as instructed; it never decides to trade.
#[derive(Debug, Clone, Serialize)]
pub struct Ledger {
    initial_cash: Decimal,
    cash: Decimal,
    asset_quantity: Decimal,
    trades: Vec<TradeRecord>,
}

impl Ledger {
    /// Creates a ledger holding only cash.
    pub fn new(initial_cash: Decimal) -> Self {
        Self {
            initial_cash,
            cash: initial_cash,
            asset_quantity: Decimal::ZERO,
            trades: Vec::new(),
        }
    }

    pub fn initial_cash(&self) -> Decimal {
        self.initial_cash
    }

    pub fn cash(&self) -> Decimal {
        self.cash
    }

    pub fn asset_quantity(&self) -> Decimal {
        self.asset_quantity
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    pub fn has_position(&self) -> bool {
        self.asset_quantity > Decimal::ZERO
    }

    /// Spends `notional` cash on the asset at `price`.
    pub fn buy(&mut self, price: Decimal, notional: Decimal) -> Result<Fill> {
        if price <= Decimal::ZERO || notional <= Decimal::ZERO {
            return Err(Error::ExecutionFailed {
                reason: format!("buy needs positive price and notional, got {price} / {notional}"),
            });
        }
        if notional > self.cash {
            return Err(Error::InsufficientCash {
                requested: notional,
                available: self.cash,
            });
        }

        let quantity = notional / price;
        self.cash -= notional;
        self.asset_quantity += quantity;
        tracing::debug!(%price, %quantity, cash = %self.cash, "Ledger buy applied.");

        Ok(Fill { price, quantity, notional })
    }

    /// Sells the entire asset balance at `price`.
    pub fn liquidate(&mut self, price: Decimal) -> Result<Fill> {
        if !self.has_position() {
            return Err(Error::NothingToLiquidate);
        }
        if price <= Decimal::ZERO {
            return Err(Error::ExecutionFailed {
                reason: format!("liquidation needs a positive price, got {price}"),
            });
        }

        let quantity = self.asset_quantity;
        let proceeds = quantity * price;
        self.cash += proceeds;
        self.asset_quantity = Decimal::ZERO;
        tracing::debug!(%price, %quantity, cash = %self.cash, "Ledger liquidation applied.");

        Ok(Fill { price, quantity, notional: proceeds })
    }

    /// Appends a trade to the log.
    pub fn record(&mut self, timestamp: i64, action: TradeAction, fill: &Fill) -> TradeRecord {
        let record = TradeRecord {
            timestamp,
            action,
            price: fill.price,
            quantity: fill.quantity,
        };
        self.trades.push(record.clone());
        record
    }

    /// Cash plus the asset balance valued at `price`.
    pub fn mark_to_market(&self, price: Decimal) -> Decimal {
        self.cash + self.asset_quantity * price
    }
}
