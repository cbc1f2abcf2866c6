// In crates/strategies/src/position.rs

use rust_decimal::Decimal;
use serde::Serialize;

/// One filled buy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PositionEntry {
    pub price: Decimal,
    pub quantity: Decimal,
}

/// The open position of a strategy: every buy since the last liquidation.
///
/// `total_quantity` is zero exactly when `entries` is empty, and so is
/// `total_invested`. Only `reset` removes entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PositionBook {
    entries: Vec<PositionEntry>,
    total_invested: Decimal,
    total_quantity: Decimal,
}

impl PositionBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a buy. Non-positive prices or quantities are ignored so the
    /// emptiness invariant cannot be broken by a degenerate fill.
    pub fn record_buy(&mut self, price: Decimal, quantity: Decimal) {
        if price <= Decimal::ZERO || quantity <= Decimal::ZERO {
            return;
        }
        self.entries.push(PositionEntry { price, quantity });
        self.total_invested += price * quantity;
        self.total_quantity += quantity;
    }

    /// Destroys the whole position in one step.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.total_invested = Decimal::ZERO;
        self.total_quantity = Decimal::ZERO;
    }

    pub fn entries(&self) -> &[PositionEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_invested(&self) -> Decimal {
        self.total_invested
    }

    pub fn total_quantity(&self) -> Decimal {
        self.total_quantity
    }

    /// Price of the most recent buy.
    pub fn last_entry_price(&self) -> Option<Decimal> {
        self.entries.last().map(|e| e.price)
    }

    /// Blended cost basis. `None` while there is no position.
    pub fn average_price(&self) -> Option<Decimal> {
        if self.total_quantity > Decimal::ZERO {
            Some(self.total_invested / self.total_quantity)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn empty_book_has_no_average() {
        let book = PositionBook::new();
        assert!(book.is_empty());
        assert_eq!(book.average_price(), None);
        assert_eq!(book.last_entry_price(), None);
    }

    #[test]
    fn buys_accumulate_totals_in_order() {
        let mut book = PositionBook::new();
        book.record_buy(dec!(100), dec!(2));
        book.record_buy(dec!(80), dec!(1));

        assert_eq!(book.entries().len(), 2);
        assert_eq!(book.total_invested(), dec!(280));
        assert_eq!(book.total_quantity(), dec!(3));
        assert_eq!(book.last_entry_price(), Some(dec!(80)));
        assert_eq!(book.average_price(), Some(dec!(280) / dec!(3)));
    }

    #[test]
    fn reset_clears_everything_and_is_idempotent() {
        let mut book = PositionBook::new();
        book.record_buy(dec!(10), dec!(1));
        book.reset();
        let once = book.clone();
        book.reset();

        assert_eq!(book, once);
        assert!(book.is_empty());
        assert_eq!(book.total_invested(), Decimal::ZERO);
        assert_eq!(book.total_quantity(), Decimal::ZERO);
    }

    #[test]
    fn degenerate_buy_is_ignored() {
        let mut book = PositionBook::new();
        book.record_buy(dec!(10), Decimal::ZERO);
        assert!(book.is_empty());
        assert_eq!(book.total_quantity(), Decimal::ZERO);
    }
}
