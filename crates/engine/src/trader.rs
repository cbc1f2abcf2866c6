// In crates/engine/src/trader.rs

use std::sync::Arc;
use std::time::Duration;

use api_client::PriceSource;
use backtester::Simulation;
use chrono::Utc;
use core_types::{Symbol, TradeRecord};
use events::{EngineEvent, EventSink};
use rust_decimal::Decimal;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// What a live session did before it was stopped.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveSummary {
    pub ticks: u64,
    pub trades: Vec<TradeRecord>,
    pub cash: Decimal,
    pub asset_quantity: Decimal,
    /// Last price the strategy actually evaluated.
    pub last_price: Option<Decimal>,
    /// Mark-to-market value at `last_price`.
    pub value: Option<Decimal>,
}

/// Paper-trades one symbol by polling its latest price on a fixed interval
/// and feeding it through a [`Simulation`].
pub struct LiveTrader {
    symbol: Symbol,
    simulation: Simulation,
    source: Arc<dyn PriceSource>,
    sink: Arc<dyn EventSink>,
    poll_interval: Duration,
    ticks: u64,
    last_price: Option<Decimal>,
}

impl LiveTrader {
    pub fn new(
        symbol: Symbol,
        simulation: Simulation,
        source: Arc<dyn PriceSource>,
        sink: Arc<dyn EventSink>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            symbol,
            simulation,
            source,
            sink,
            poll_interval,
            ticks: 0,
            last_price: None,
        }
    }

    /// Polls until `stop` turns true or its sender is dropped. Fetch and step
    /// failures are reported and the loop moves on to the next tick.
    pub async fn run(mut self, mut stop: watch::Receiver<bool>) -> anyhow::Result<LiveSummary> {
        if self.poll_interval.is_zero() {
            anyhow::bail!("Poll interval must be positive");
        }

        tracing::info!(
            symbol = %self.symbol,
            strategy = self.simulation.strategy().name(),
            interval_secs = self.poll_interval.as_secs_f64(),
            "Starting live trader."
        );
        self.sink.emit(EngineEvent::Started {
            symbol: self.symbol.clone(),
            cash: self.simulation.ledger().cash(),
        });

        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *stop.borrow() {
                break;
            }

            tokio::select! {
                biased;
                changed = stop.changed() => {
                    if changed.is_err() {
                        tracing::debug!("Stop sender dropped.");
                        break;
                    }
                    continue;
                }
                _ = ticker.tick() => {}
            }

            if *stop.borrow() {
                break;
            }
            self.poll_once().await;
        }

        Ok(self.finish())
    }

    async fn poll_once(&mut self) {
        self.ticks += 1;

        // --- 1. Fetch ---
        let price = match self.source.latest_price(&self.symbol).await {
            Ok(price) => price,
            Err(e) => {
                self.sink.emit(EngineEvent::PriceFetchFailed { error: e.to_string() });
                return;
            }
        };

        let timestamp = Utc::now().timestamp_millis();
        self.sink.emit(EngineEvent::PriceObserved { timestamp, price });

        // --- 2. Step ---
        match self.simulation.step(timestamp, price) {
            Ok(trade) => {
                self.last_price = Some(price);
                if let Some(trade) = trade {
                    let ledger = self.simulation.ledger();
                    self.sink.emit(EngineEvent::TradeExecuted {
                        trade,
                        cash: ledger.cash(),
                        asset_quantity: ledger.asset_quantity(),
                    });
                }
            }
            Err(e) => {
                self.sink.emit(EngineEvent::StepFailed {
                    price,
                    error: format!("{e:#}"),
                });
            }
        }
    }

    fn finish(self) -> LiveSummary {
        let ledger = self.simulation.ledger();
        let value = self.last_price.map(|p| ledger.mark_to_market(p));

        self.sink.emit(EngineEvent::Stopped {
            ticks: self.ticks,
            trades: ledger.trades().len(),
            value,
        });

        LiveSummary {
            ticks: self.ticks,
            trades: ledger.trades().to_vec(),
            cash: ledger.cash(),
            asset_quantity: ledger.asset_quantity(),
            last_price: self.last_price,
            value,
        }
    }
}
