// In crates/api-client/src/price_source.rs

use async_trait::async_trait;
use core_types::Symbol;
use rust_decimal::Decimal;

use crate::{ApiClient, Result};

/// Anything that can quote the latest price of a symbol.
///
/// Implementations may fail transiently; callers are expected to retry on
/// their next poll rather than give up.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn latest_price(&self, symbol: &Symbol) -> Result<Decimal>;
}

#[async_trait]
impl PriceSource for ApiClient {
    async fn latest_price(&self, symbol: &Symbol) -> Result<Decimal> {
        self.get_latest_price(symbol).await
    }
}
