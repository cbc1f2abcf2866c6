// In crates/strategies/src/types.rs

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ThresholdRecoverySettings {
    /// Dip below the most recent buy that triggers another buy.
    pub buy_threshold: Decimal,
    /// Gain over the average cost that triggers a full sell.
    pub sell_threshold: Decimal,
    /// Loss against the average cost that forces an exit.
    pub max_drawdown: Decimal,
}

impl Default for ThresholdRecoverySettings {
    fn default() -> Self {
        Self {
            buy_threshold: dec!(0.10),
            sell_threshold: dec!(0.10),
            max_drawdown: dec!(0.30),
        }
    }
}

impl ThresholdRecoverySettings {
    pub fn validate(&self) -> Result<()> {
        open_unit("buy_threshold", self.buy_threshold)?;
        open_unit("sell_threshold", self.sell_threshold)?;
        drawdown("max_drawdown", self.max_drawdown)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GridSettings {
    /// Price step, used both for re-entry below the last buy and for the
    /// profit target above the average cost.
    pub grid_size: Decimal,
    /// Accepted for configuration compatibility. Not enforced.
    pub max_levels: u32,
    pub max_drawdown: Decimal,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            grid_size: dec!(0.10),
            max_levels: 5,
            max_drawdown: dec!(0.30),
        }
    }
}

impl GridSettings {
    pub fn validate(&self) -> Result<()> {
        open_unit("grid_size", self.grid_size)?;
        if self.max_levels == 0 {
            return Err(Error::InvalidSettings("max_levels must be at least 1".into()));
        }
        drawdown("max_drawdown", self.max_drawdown)
    }
}

fn open_unit(field: &str, value: Decimal) -> Result<()> {
    if value <= Decimal::ZERO || value >= Decimal::ONE {
        return Err(Error::InvalidSettings(format!(
            "{field} must be in (0, 1), got {value}"
        )));
    }
    Ok(())
}

// A drawdown of exactly 1 means "only exit at zero", which is a legitimate
// way to disable the stop.
fn drawdown(field: &str, value: Decimal) -> Result<()> {
    if value <= Decimal::ZERO || value > Decimal::ONE {
        return Err(Error::InvalidSettings(format!(
            "{field} must be in (0, 1], got {value}"
        )));
    }
    Ok(())
}
