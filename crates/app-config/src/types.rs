// In crates/app-config/src/types.rs

use core_types::StrategyConfig;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{Error, Result};

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    /// The application's general settings.
    pub app: AppSettings,
    /// Settings for the Binance market-data API.
    pub binance: BinanceSettings,
    /// Cash and trade sizing for a simulation run.
    pub run: RunSettings,
    /// The strategy to run, by name plus its `params` table.
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub live: LiveSettings,
    #[serde(default)]
    pub windows: WindowSettings,
}

impl Settings {
    /// Rejects configurations that could not produce a meaningful run.
    pub fn validate(&self) -> Result<()> {
        self.run.validate()?;
        self.live.validate()?;
        self.windows.validate()?;
        // Building the strategy once validates its parameters.
        strategies::create_strategy(&self.strategy)?;
        Ok(())
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct AppSettings {
    /// The environment the application is running in (e.g., "development", "production").
    pub environment: String,
    /// The log level for the application.
    pub log_level: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct BinanceSettings {
    /// The REST API base URL for Binance.
    pub rest_base_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct RunSettings {
    /// Share of the *current* cash invested on each buy.
    pub buy_fraction_of_cash: Decimal,
    /// Buys whose notional does not exceed this are skipped.
    pub minimum_trade_notional: Decimal,
    pub initial_cash: Decimal,
}

impl RunSettings {
    pub fn validate(&self) -> Result<()> {
        if self.buy_fraction_of_cash <= Decimal::ZERO || self.buy_fraction_of_cash > Decimal::ONE {
            return Err(Error::Invalid(format!(
                "run.buy_fraction_of_cash must be in (0, 1], got {}",
                self.buy_fraction_of_cash
            )));
        }
        if self.minimum_trade_notional <= Decimal::ZERO {
            return Err(Error::Invalid("run.minimum_trade_notional must be positive".into()));
        }
        if self.initial_cash <= Decimal::ZERO {
            return Err(Error::Invalid("run.initial_cash must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct LiveSettings {
    pub symbol: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

impl Default for LiveSettings {
    fn default() -> Self {
        Self {
            symbol: "BTCUSDT".to_string(),
            poll_interval_secs: default_poll_interval(),
        }
    }
}

impl LiveSettings {
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            return Err(Error::Invalid("live.poll_interval_secs must be at least 1".into()));
        }
        if self.symbol.trim().is_empty() {
            return Err(Error::Invalid("live.symbol must not be empty".into()));
        }
        Ok(())
    }
}

/// Parameters of the rolling-window and Monte Carlo batches, in bars.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct WindowSettings {
    pub window_len: usize,
    pub step: usize,
    pub simulations: usize,
    pub seed: u64,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            window_len: 30,
            step: 15,
            simulations: 500,
            seed: 42,
        }
    }
}

impl WindowSettings {
    pub fn validate(&self) -> Result<()> {
        if self.window_len == 0 || self.step == 0 || self.simulations == 0 {
            return Err(Error::Invalid(
                "windows.window_len, windows.step and windows.simulations must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Helper functions for serde defaults
fn default_poll_interval() -> u64 { 60 }
fn default_request_timeout() -> u64 { 10 }
