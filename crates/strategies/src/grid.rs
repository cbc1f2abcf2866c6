// In crates/strategies/src/grid.rs

use rust_decimal::Decimal;

use crate::types::GridSettings;
use crate::{decline, rise, PositionBook, Strategy};

/// Fixed-step grid: buy every `grid_size` drop below the previous buy, take
/// profit one `grid_size` above the average cost.
///
/// The sell target deliberately reuses `grid_size` instead of a separate
/// take-profit parameter, and `max_levels` does not cap the number of
/// entries. Both mirror the behaviour this strategy was calibrated with.
#[derive(Debug, Clone)]
pub struct GridStrategy {
    settings: GridSettings,
    book: PositionBook,
}

impl GridStrategy {
    pub fn new(settings: GridSettings) -> Self {
        Self {
            settings,
            book: PositionBook::new(),
        }
    }

    pub fn settings(&self) -> &GridSettings {
        &self.settings
    }
}

impl Strategy for GridStrategy {
    fn name(&self) -> &'static str {
        "Grid"
    }

    fn should_buy(&self, price: Decimal) -> bool {
        match self.book.last_entry_price() {
            None => true,
            Some(last) => decline(last, price) >= self.settings.grid_size,
        }
    }

    fn should_sell(&self, price: Decimal) -> bool {
        if self.book.is_empty() {
            return false;
        }
        self.book
            .average_price()
            .is_some_and(|avg| rise(avg, price) >= self.settings.grid_size)
    }

    fn should_exit(&self, price: Decimal) -> bool {
        if self.book.is_empty() {
            return false;
        }
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
