// In crates/backtester/src/simulation.rs

use anyhow::{bail, Context};
use core_types::{TradeAction, TradeRecord};
use execution::Ledger;
use rust_decimal::Decimal;
use strategies::Strategy;
use tracing::info;

/// Run-mode sizing: each buy invests a fixed fraction of the cash available
/// at that moment, and buys whose notional does not exceed the minimum are
/// skipped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizingRules {
    pub buy_fraction_of_cash: Decimal,
    pub minimum_trade_notional: Decimal,
}

/// One strategy instance bound to one ledger.
///
/// `step` is the only way state moves forward, which keeps the strategy's
/// position and the ledger's asset balance changing together.
pub struct Simulation {
    strategy: Box<dyn Strategy + Send>,
    ledger: Ledger,
    sizing: SizingRules,
}

impl Simulation {
    pub fn new(strategy: Box<dyn Strategy + Send>, initial_cash: Decimal, sizing: SizingRules) -> Self {
        Self {
            strategy,
            ledger: Ledger::new(initial_cash),
            sizing,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn strategy(&self) -> &dyn Strategy {
        self.strategy.as_ref()
    }

    pub fn sizing(&self) -> SizingRules {
        self.sizing
    }

    pub fn mark_to_market(&self, price: Decimal) -> Decimal {
        self.ledger.mark_to_market(price)
    }

    /// Consumes the simulation, handing back the terminal ledger.
    pub fn into_ledger(self) -> Ledger {
        self.ledger
    }

    /// Evaluates one price point. At most one trade happens per step, chosen
    /// in the order buy, sell, forced exit.
    pub fn step(&mut self, timestamp: i64, price: Decimal) -> anyhow::Result<Option<TradeRecord>> {
        if price <= Decimal::ZERO {
            bail!("Price at {timestamp} must be positive, got {price}");
        }

        // --- 1. Buy ---
        // A wanted buy claims the step even when it is too small to place.
        if self.strategy.should_buy(price) {
            let invest = self.ledger.cash() * self.sizing.buy_fraction_of_cash;
            if invest <= self.sizing.minimum_trade_notional {
                tracing::debug!(%price, %invest, "Buy below minimum notional skipped.");
                return Ok(None);
            }
            let fill = self
                .ledger
                .buy(price, invest)
                .with_context(|| format!("Buy at {price} failed"))?;
            self.strategy.on_buy(price, fill.quantity);
            let record = self.ledger.record(timestamp, TradeAction::Buy, &fill);
            self.check_lock_step()?;
            info!(
                strategy = self.strategy.name(),
                %price,
                quantity = %fill.quantity,
                invested = %fill.notional,
                cash = %self.ledger.cash(),
                "BUY executed."
            );
            return Ok(Some(record));
        }

        // Nothing to liquidate means sell and exit are not actionable.
        if !self.ledger.has_position() {
            return Ok(None);
        }

        // --- 2. Sell, then 3. forced exit ---
        let action = if self.strategy.should_sell(price) {
            TradeAction::Sell
        } else if self.strategy.should_exit(price) {
            TradeAction::ForcedExit
        } else {
            return Ok(None);
        };

        let fill = self
            .ledger
            .liquidate(price)
            .with_context(|| format!("{action} at {price} failed"))?;
        self.strategy.on_sell();
        let record = self.ledger.record(timestamp, action, &fill);
        self.check_lock_step()?;
        info!(
            strategy = self.strategy.name(),
            %action,
            %price,
            quantity = %fill.quantity,
            proceeds = %fill.notional,
            cash = %self.ledger.cash(),
            "Position liquidated."
        );
        Ok(Some(record))
    }

    fn check_lock_step(&self) -> anyhow::Result<()> {
        let held = self.ledger.asset_quantity();
        let tracked = self.strategy.position().total_quantity();
        if held != tracked {
            bail!("Ledger holds {held} but {} tracks {tracked}", self.strategy.name());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use strategies::types::{GridSettings, ThresholdRecoverySettings};
    use strategies::{GridStrategy, PositionBook, ThresholdRecovery};

    fn sizing(fraction: Decimal) -> SizingRules {
        SizingRules {
            buy_fraction_of_cash: fraction,
            minimum_trade_notional: dec!(10),
        }
    }

    fn threshold(buy: Decimal, sell: Decimal, drawdown: Decimal) -> Box<dyn Strategy + Send> {
        Box::new(ThresholdRecovery::new(ThresholdRecoverySettings {
            buy_threshold: buy,
            sell_threshold: sell,
            max_drawdown: drawdown,
        }))
    }

    fn run(sim: &mut Simulation, prices: &[Decimal]) -> Vec<TradeRecord> {
        prices
            .iter()
            .enumerate()
            .filter_map(|(i, p)| sim.step(i as i64, *p).unwrap())
            .collect()
    }

    #[test]
    fn accumulates_on_dips_and_holds_below_average() {
        let mut sim = Simulation::new(threshold(dec!(0.05), dec!(0.10), dec!(0.30)), dec!(1000), sizing(dec!(0.5)));
        let trades = run(&mut sim, &[dec!(100), dec!(94), dec!(85), dec!(95)]);

        assert_eq!(trades.len(), 3);
        assert!(trades.iter().all(|t| t.action == TradeAction::Buy));
        assert_eq!(trades[0].quantity, dec!(5));
        assert_eq!(sim.ledger().cash(), dec!(125));

        let expected_qty = dec!(5) + dec!(250) / dec!(94) + dec!(125) / dec!(85);
        assert_eq!(sim.ledger().asset_quantity(), expected_qty);
        let invested = sim.strategy().position().total_invested();
        assert!((invested - dec!(875)).abs() < dec!(0.000001));

        let avg = sim.strategy().position().average_price().unwrap();
        assert!(avg > dec!(95.8) && avg < dec!(95.9));
        assert_eq!(sim.mark_to_market(dec!(95)), dec!(125) + expected_qty * dec!(95));
    }

    #[test]
    fn sells_once_price_recovers_above_average() {
        let mut sim = Simulation::new(threshold(dec!(0.05), dec!(0.10), dec!(0.30)), dec!(1000), sizing(dec!(0.5)));
        run(&mut sim, &[dec!(100), dec!(94), dec!(85), dec!(95)]);
        let qty = sim.ledger().asset_quantity();

        let sell = sim.step(4, dec!(106)).unwrap().unwrap();
        assert_eq!(sell.action, TradeAction::Sell);
        assert_eq!(sell.quantity, qty);
        assert_eq!(sim.ledger().cash(), dec!(125) + qty * dec!(106));
        assert!(!sim.ledger().has_position());
        assert!(sim.strategy().position().is_empty());
    }

    #[test]
    fn exact_buy_threshold_triggers_and_just_above_does_not() {
        let mut sim = Simulation::new(threshold(dec!(0.05), dec!(0.10), dec!(0.30)), dec!(1000), sizing(dec!(0.5)));
        sim.step(0, dec!(100)).unwrap();
        assert!(sim.step(1, dec!(95.01)).unwrap().is_none());
        assert_eq!(sim.step(2, dec!(95)).unwrap().unwrap().action, TradeAction::Buy);
    }

    #[test]
    fn forced_exit_on_drawdown() {
        let mut sim = Simulation::new(threshold(dec!(0.5), dec!(0.10), dec!(0.30)), dec!(1000), sizing(dec!(0.5)));
        sim.step(0, dec!(100)).unwrap();
        let exit = sim.step(1, dec!(69)).unwrap().unwrap();
        assert_eq!(exit.action, TradeAction::ForcedExit);
        assert_eq!(sim.ledger().cash(), dec!(500) + dec!(5) * dec!(69));
        assert!(sim.strategy().position().is_empty());
    }

    #[test]
    fn unaffordable_buy_consumes_the_step() {
        let mut sim = Simulation::new(threshold(dec!(0.05), dec!(0.10), dec!(0.30)), dec!(1000), sizing(dec!(0.5)));
        let prices: Vec<Decimal> = (2..=10).rev().map(|p| Decimal::from(p * 10)).collect();
        let trades = run(&mut sim, &prices);

        // Buys at 100 down to 50 leave 15.625 cash; half of that is below the minimum.
        assert_eq!(trades.len(), 6);
        assert!(trades.iter().all(|t| t.action == TradeAction::Buy));
        assert_eq!(sim.ledger().cash(), dec!(15.625));

        // Each later dip still wants a buy, so the drawdown exit never fires.
        assert!(sim.strategy().should_exit(dec!(20)));
        assert!(sim.step(99, dec!(20)).unwrap().is_none());
        assert!(sim.ledger().has_position());
    }

    #[test]
    fn buy_at_or_below_minimum_notional_is_skipped() {
        let mut sim = Simulation::new(threshold(dec!(0.05), dec!(0.10), dec!(0.30)), dec!(20), sizing(dec!(0.5)));
        assert!(sim.step(0, dec!(100)).unwrap().is_none());
        assert_eq!(sim.ledger().cash(), dec!(20));
        assert!(sim.ledger().trades().is_empty());
        assert!(sim.strategy().position().is_empty());
    }

    #[test]
    fn rejects_non_positive_price() {
        let mut sim = Simulation::new(threshold(dec!(0.05), dec!(0.10), dec!(0.30)), dec!(1000), sizing(dec!(0.5)));
        assert!(sim.step(0, Decimal::ZERO).is_err());
        assert!(sim.ledger().trades().is_empty());
    }

    /// Answers yes to every liquidation question, to probe the driver's guard.
    struct EagerSeller {
        position: PositionBook,
    }

    impl Strategy for EagerSeller {
        fn name(&self) -> &'static str {
            "EagerSeller"
        }
        fn should_buy(&self, _price: Decimal) -> bool {
            false
        }
        fn should_sell(&self, _price: Decimal) -> bool {
            true
        }
        fn should_exit(&self, _price: Decimal) -> bool {
            true
        }
        fn on_buy(&mut self, price: Decimal, quantity: Decimal) {
            self.position.record_buy(price, quantity);
        }
        fn on_sell(&mut self) {
            self.position.reset();
        }
        fn position(&self) -> &PositionBook {
            &self.position
        }
    }

    #[test]
    fn empty_position_never_sells_or_exits() {
        let strategy = Box::new(EagerSeller {
            position: PositionBook::default(),
        });
        let mut sim = Simulation::new(strategy, dec!(1000), sizing(dec!(0.5)));
        let trades = run(&mut sim, &[dec!(100), dec!(50), dec!(200)]);
        assert!(trades.is_empty());
        assert_eq!(sim.ledger().cash(), dec!(1000));
    }

    #[test]
    fn grid_max_levels_does_not_change_the_trade_log() {
        let prices = [
            dec!(100), dec!(94), dec!(89), dec!(84), dec!(80), dec!(76), dec!(85), dec!(90), dec!(70),
        ];
        let logs: Vec<Vec<TradeRecord>> = [1u32, 20]
            .into_iter()
            .map(|max_levels| {
                let strategy = Box::new(GridStrategy::new(GridSettings {
                    grid_size: dec!(0.05),
                    max_levels,
                    max_drawdown: dec!(1.0),
                }));
                let mut sim = Simulation::new(strategy, dec!(10000), sizing(dec!(0.2)));
                run(&mut sim, &prices)
            })
            .collect();

        assert!(logs[0].iter().filter(|t| t.action == TradeAction::Buy).count() > 1);
        assert_eq!(logs[0], logs[1]);
    }
}
