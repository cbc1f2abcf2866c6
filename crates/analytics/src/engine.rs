// In crates/analytics/src/engine.rs

use crate::types::{ProfitDistribution, RunReport};
use core_types::TradeRecord;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// The engine responsible for turning terminal run state into reports.
#[derive(Default)]
pub struct AnalyticsEngine;

impl AnalyticsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the summary of a finished run.
    pub fn run_report(
        &self,
        initial_cash: Decimal,
        final_value: Decimal,
        cash: Decimal,
        asset_quantity: Decimal,
        trades: &[TradeRecord],
    ) -> RunReport {
        RunReport {
            initial_cash,
            final_value,
            net_profit: final_value - initial_cash,
            trade_count: trades.len(),
            cash,
            asset_quantity,
            trades: trades.to_vec(),
        }
    }

    /// Aggregates per-run profits. Returns `None` for an empty sample.
    pub fn profit_distribution(&self, profits: &[Decimal]) -> Option<ProfitDistribution> {
        if profits.is_empty() {
            return None;
        }

        let mut sorted = profits.to_vec();
        sorted.sort();

        let samples = sorted.len();
        let count = Decimal::from(samples);
        let total: Decimal = sorted.iter().sum();
        let mid = samples / 2;
        let median = if samples % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / dec!(2)
        } else {
            sorted[mid]
        };
        let wins = sorted.iter().filter(|p| **p > Decimal::ZERO).count();

        Some(ProfitDistribution {
            samples,
            total,
            mean: total / count,
            median,
            win_rate_pct: Decimal::from(wins) / count * dec!(100),
            worst: sorted[0],
            best: sorted[samples - 1],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::TradeAction;

    #[test]
    fn run_report_derives_profit_and_count() {
        let trades = vec![TradeRecord {
            timestamp: 0,
            action: TradeAction::Buy,
            price: dec!(100),
            quantity: dec!(1),
        }];
        let report = AnalyticsEngine::new().run_report(dec!(1000), dec!(1100), dec!(900), dec!(2), &trades);
        assert_eq!(report.net_profit, dec!(100));
        assert_eq!(report.trade_count, 1);
    }

    #[test]
    fn distribution_of_odd_sample() {
        let d = AnalyticsEngine::new()
            .profit_distribution(&[dec!(10), dec!(-5), dec!(30)])
            .unwrap();
        assert_eq!(d.samples, 3);
        assert_eq!(d.total, dec!(35));
        assert_eq!(d.median, dec!(10));
        assert_eq!(d.worst, dec!(-5));
        assert_eq!(d.best, dec!(30));
        assert_eq!(d.win_rate_pct.round_dp(2), dec!(66.67));
    }

    #[test]
    fn distribution_of_even_sample_averages_middle() {
        let d = AnalyticsEngine::new()
            .profit_distribution(&[dec!(4), dec!(0), dec!(-2), dec!(8)])
            .unwrap();
        assert_eq!(d.median, dec!(2));
        assert_eq!(d.mean, dec!(2.5));
        assert_eq!(d.win_rate_pct, dec!(50));
    }

    #[test]
    fn empty_sample_has_no_distribution() {
        assert!(AnalyticsEngine::new().profit_distribution(&[]).is_none());
    }
}
