// In crates/strategies/src/lib.rs

use rust_decimal::Decimal;

pub mod error;
pub mod factory;
pub mod grid;
pub mod position;
pub mod threshold_recovery;
pub mod types;

pub use error::{Error, Result};
pub use factory::create_strategy;
pub use grid::GridStrategy;
pub use position::{PositionBook, PositionEntry};
pub use threshold_recovery::ThresholdRecovery;

/// The universal interface for a position-accumulating strategy.
///
/// A strategy owns its open position and answers three predicates about the
/// current price. The driver evaluates them in the fixed order buy, sell,
/// exit and reports back what it actually executed through `on_buy` and
/// `on_sell`. A strategy never mutates a ledger itself.
pub trait Strategy {
    /// The name of the strategy.
    fn name(&self) -> &'static str;

    /// Whether the strategy wants to add to its position at `price`.
    fn should_buy(&self, price: Decimal) -> bool;

    /// Whether the strategy wants to take profit on its whole position.
    fn should_sell(&self, price: Decimal) -> bool;

    /// Whether the stop-loss on the whole position has been hit.
    fn should_exit(&self, price: Decimal) -> bool;

    /// Called after the driver bought `quantity` at `price`.
    fn on_buy(&mut self, price: Decimal, quantity: Decimal);

    /// Called after the driver liquidated the position, by sell or exit.
    fn on_sell(&mut self);

    /// Read-only view of the open position.
    fn position(&self) -> &PositionBook;
}

/// Fractional decline of `price` below `reference`. Callers guarantee a
/// positive reference.
pub(crate) fn decline(reference: Decimal, price: Decimal) -> Decimal {
    (reference - price) / reference
}

/// Fractional rise of `price` above `reference`.
pub(crate) fn rise(reference: Decimal, price: Decimal) -> Decimal {
    (price - reference) / reference
}
