// In crates/backtester/src/lib.rs

pub mod simulation;
pub mod windows;

use analytics::{AnalyticsEngine, RunReport};
use anyhow::{bail, Context};
use core_types::{Kline, Symbol, TradeRecord};
use execution::Ledger;
use rust_decimal::Decimal;
use strategies::Strategy;
use tracing::info;

pub use simulation::{Simulation, SizingRules};
pub use windows::{monte_carlo_starts, rolling_starts, run_monte_carlo, run_rolling, run_windows};

/// Terminal state of a finished run.
#[derive(Debug, Clone)]
pub struct SimulationOutcome {
    pub strategy_name: &'static str,
    pub ledger: Ledger,
    /// Close of the final bar, used for valuation.
    pub last_price: Decimal,
    pub final_value: Decimal,
}

impl SimulationOutcome {
    pub fn trades(&self) -> &[TradeRecord] {
        self.ledger.trades()
    }

    pub fn profit(&self) -> Decimal {
        self.final_value - self.ledger.initial_cash()
    }

    pub fn report(&self) -> RunReport {
        AnalyticsEngine::new().run_report(
            self.ledger.initial_cash(),
            self.final_value,
            self.ledger.cash(),
            self.ledger.asset_quantity(),
            self.ledger.trades(),
        )
    }
}

/// The engine for running a strategy over a finite historical series.
pub struct Backtester {
    /// The symbol being tested, for logging.
    pub symbol: Symbol,
    simulation: Simulation,
}

impl Backtester {
    pub fn new(
        symbol: Symbol,
        strategy: Box<dyn Strategy + Send>,
        initial_cash: Decimal,
        sizing: SizingRules,
    ) -> Self {
        Self {
            symbol,
            simulation: Simulation::new(strategy, initial_cash, sizing),
        }
    }

    /// Feeds every close in order, then values the terminal position at the
    /// last close.
    pub fn run(mut self, klines: &[Kline]) -> anyhow::Result<SimulationOutcome> {
        let Some(last) = klines.last() else {
            bail!("Cannot backtest {} on an empty price series", self.symbol);
        };

        if let Some(pair) = klines.windows(2).find(|pair| pair[1].open_time <= pair[0].open_time) {
            bail!(
                "Price series for {} is not strictly increasing in time: {} follows {}",
                self.symbol,
                pair[1].open_time,
                pair[0].open_time
            );
        }

        info!(
            symbol = %self.symbol,
            strategy = self.simulation.strategy().name(),
            bars = klines.len(),
            "Starting backtest."
        );

        for kline in klines {
            self.simulation
                .step(kline.open_time, kline.close)
                .with_context(|| format!("Backtest step at {} failed", kline.open_time))?;
        }

        let strategy_name = self.simulation.strategy().name();
        let last_price = last.close;
        let final_value = self.simulation.mark_to_market(last_price);
        let ledger = self.simulation.into_ledger();

        info!(
            symbol = %self.symbol,
            trades = ledger.trades().len(),
            %final_value,
            "Backtest finished."
        );

        Ok(SimulationOutcome {
            strategy_name,
            ledger,
            last_price,
            final_value,
        })
    }
}
