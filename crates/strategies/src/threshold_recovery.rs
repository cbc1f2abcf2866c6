// In crates/strategies/src/threshold_recovery.rs

use rust_decimal::Decimal;

use crate::types::ThresholdRecoverySettings;
use crate::{decline, rise, PositionBook, Strategy};

/// Dollar-cost averaging into weakness with a single accumulating position.
///
/// The first price always buys. Later buys need a dip of `buy_threshold`
/// below the *last* buy, so a falling market keeps adding entries. Profit
/// and stop-loss are both measured against the blended average cost.
#[derive(Debug, Clone)]
pub struct ThresholdRecovery {
    settings: ThresholdRecoverySettings,
    book: PositionBook,
}

impl ThresholdRecovery {
    pub fn new(settings: ThresholdRecoverySettings) -> Self {
        Self {
            settings,
            book: PositionBook::new(),
        }
    }

    pub fn settings(&self) -> &ThresholdRecoverySettings {
        &self.settings
    }
}

impl Strategy for ThresholdRecovery {
    fn name(&self) -> &'static str {
        "ThresholdRecovery"
    }

    fn should_buy(&self, price: Decimal) -> bool {
        match self.book.last_entry_price() {
            None => true,
            Some(last) => decline(last, price) >= self.settings.buy_threshold,
        }
    }

    fn should_sell(&self, price: Decimal) -> bool {
        self.book
            .average_price()
            .is_some_and(|avg| rise(avg, price) >= self.settings.sell_threshold)
    }

    fn should_exit(&self, price: Decimal) -> bool {
        self.book
            .average_price()
            .is_some_and(|avg| decline(avg, price) >= self.settings.max_drawdown)
    }

    fn on_buy(&mut self, price: Decimal, quantity: Decimal) {
        self.book.record_buy(price, quantity);
    }

    fn on_sell(&mut self) {
        self.book.reset();
    }

    fn position(&self) -> &PositionBook {
        &self.book
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn strategy() -> ThresholdRecovery {
        ThresholdRecovery::new(ThresholdRecoverySettings {
            buy_threshold: dec!(0.05),
            sell_threshold: dec!(0.10),
            max_drawdown: dec!(0.30),
        })
    }

    #[test]
    fn first_price_always_buys() {
        let s = strategy();
        assert!(s.should_buy(dec!(123.45)));
        assert!(!s.should_sell(dec!(1000)));
        assert!(!s.should_exit(dec!(0.01)));
    }

    #[test]
    fn dip_trigger_is_inclusive_at_the_boundary() {
        let mut s = strategy();
        s.on_buy(dec!(100), dec!(1));
        assert!(s.should_buy(dec!(95.00)));
        assert!(!s.should_buy(dec!(95.01)));
    }

    #[test]
    fn dip_is_measured_from_last_buy_not_average() {
        let mut s = strategy();
        s.on_buy(dec!(100), dec!(1));
        s.on_buy(dec!(90), dec!(1));
        // 5% under the average (95) would be 90.25, but the reference is 90.
        assert!(!s.should_buy(dec!(90.25)));
        assert!(s.should_buy(dec!(85.5)));
    }

    #[test]
    fn sell_and_exit_use_average_cost() {
        let mut s = strategy();
        s.on_buy(dec!(100), dec!(1));
        s.on_buy(dec!(80), dec!(1));
        // average is 90
        assert!(s.should_sell(dec!(99)));
        assert!(!s.should_sell(dec!(98.99)));
        assert!(s.should_exit(dec!(63)));
        assert!(!s.should_exit(dec!(63.01)));
    }

    #[test]
    fn on_sell_liquidates_everything_and_repeats_safely() {
        let mut s = strategy();
        s.on_buy(dec!(100), dec!(1));
        s.on_buy(dec!(90), dec!(2));
        s.on_sell();
        let after_first = s.position().clone();
        s.on_sell();

        assert_eq!(s.position(), &after_first);
        assert!(s.position().is_empty());
        assert!(s.should_buy(dec!(500)));
    }
}
