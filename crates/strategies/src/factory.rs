// In crates/strategies/src/factory.rs

use core_types::StrategyConfig;

use crate::types::{GridSettings, ThresholdRecoverySettings};
use crate::{Error, GridStrategy, Result, Strategy, ThresholdRecovery};

pub const THRESHOLD_RECOVERY: &str = "threshold_recovery";
pub const GRID: &str = "grid";

/// Builds a fresh strategy instance from its configuration block.
///
/// Parameters are validated here, so a successful return means the strategy
/// is safe to run.
pub fn create_strategy(config: &StrategyConfig) -> Result<Box<dyn Strategy + Send>> {
    let strategy: Box<dyn Strategy + Send> = match config.name.as_str() {
        THRESHOLD_RECOVERY => {
            let settings: ThresholdRecoverySettings = config.parse_params()?;
            settings.validate()?;
            Box::new(ThresholdRecovery::new(settings))
        }
        GRID => {
            let settings: GridSettings = config.parse_params()?;
            settings.validate()?;
            Box::new(GridStrategy::new(settings))
        }
        unknown => return Err(Error::UnknownStrategy(unknown.to_string())),
    };
    Ok(strategy)
}
