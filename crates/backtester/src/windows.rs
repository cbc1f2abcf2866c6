// In crates/backtester/src/windows.rs

use analytics::WindowResult;
use anyhow::{bail, Context};
use core_types::{Kline, Symbol};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use rust_decimal::Decimal;
use strategies::Strategy;
use tracing::info;

use crate::{Backtester, SizingRules};

fn check_window(len: usize, window_len: usize) -> anyhow::Result<()> {
    if window_len == 0 {
        bail!("Window length must be at least one bar");
    }
    if window_len > len {
        bail!("Window of {window_len} bars does not fit a series of {len} bars");
    }
    Ok(())
}

/// Start indices of consecutive windows, advanced by `step` bars while the
/// window still fits.
pub fn rolling_starts(len: usize, window_len: usize, step: usize) -> anyhow::Result<Vec<usize>> {
    check_window(len, window_len)?;
    if step == 0 {
        bail!("Rolling step must be at least one bar");
    }
    Ok((0..=len - window_len).step_by(step).collect())
}

/// `simulations` start indices drawn uniformly from `0..=len - window_len`.
pub fn monte_carlo_starts(
    len: usize,
    window_len: usize,
    simulations: usize,
    seed: u64,
) -> anyhow::Result<Vec<usize>> {
    check_window(len, window_len)?;
    if simulations == 0 {
        bail!("Monte Carlo needs at least one simulation");
    }
    let max_start = len - window_len;
    let mut rng = StdRng::seed_from_u64(seed);
    Ok((0..simulations).map(|_| rng.gen_range(0..=max_start)).collect())
}

/// Runs an independent backtest over each window in parallel. Every window
/// gets its own strategy from `factory` and its own ledger. Results keep the
/// order of `starts`.
pub fn run_windows<F>(
    symbol: &Symbol,
    klines: &[Kline],
    starts: &[usize],
    window_len: usize,
    initial_cash: Decimal,
    sizing: SizingRules,
    factory: F,
) -> anyhow::Result<Vec<WindowResult>>
where
    F: Fn() -> anyhow::Result<Box<dyn Strategy + Send>> + Sync,
{
    check_window(klines.len(), window_len)?;

    starts
        .par_iter()
        .map(|&start| {
            let window = klines
                .get(start..start + window_len)
                .with_context(|| format!("Window at {start} runs past the series"))?;
            let backtester = Backtester::new(symbol.clone(), factory()?, initial_cash, sizing);
            let outcome = backtester
                .run(window)
                .with_context(|| format!("Window starting at bar {start} failed"))?;

            Ok(WindowResult {
                start_index: start,
                start: window[0].open_time,
                end: window[window_len - 1].open_time,
                profit: outcome.profit(),
                final_value: outcome.final_value,
                trades: outcome.ledger.trades().to_vec(),
            })
        })
        .collect()
}

/// Rolling-window evaluation over the whole series.
pub fn run_rolling<F>(
    symbol: &Symbol,
    klines: &[Kline],
    window_len: usize,
    step: usize,
    initial_cash: Decimal,
    sizing: SizingRules,
    factory: F,
) -> anyhow::Result<Vec<WindowResult>>
where
    F: Fn() -> anyhow::Result<Box<dyn Strategy + Send>> + Sync,
{
    let starts = rolling_starts(klines.len(), window_len, step)?;
    info!(windows = starts.len(), window_len, step, "Running rolling windows.");
    run_windows(symbol, klines, &starts, window_len, initial_cash, sizing, factory)
}

/// Monte Carlo evaluation over randomly placed windows. The same seed always
/// yields the same windows and therefore the same results.
#[allow(clippy::too_many_arguments)]
pub fn run_monte_carlo<F>(
    symbol: &Symbol,
    klines: &[Kline],
    window_len: usize,
    simulations: usize,
    seed: u64,
    initial_cash: Decimal,
    sizing: SizingRules,
    factory: F,
) -> anyhow::Result<Vec<WindowResult>>
where
    F: Fn() -> anyhow::Result<Box<dyn Strategy + Send>> + Sync,
{
    let starts = monte_carlo_starts(klines.len(), window_len, simulations, seed)?;
    info!(simulations, window_len, seed, "Running Monte Carlo windows.");
    run_windows(symbol, klines, &starts, window_len, initial_cash, sizing, factory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use strategies::ThresholdRecovery;
    use strategies::types::ThresholdRecoverySettings;

    fn sizing() -> SizingRules {
        SizingRules {
            buy_fraction_of_cash: dec!(0.5),
            minimum_trade_notional: dec!(10),
        }
    }

    fn factory() -> anyhow::Result<Box<dyn Strategy + Send>> {
        Ok(Box::new(ThresholdRecovery::new(ThresholdRecoverySettings::default())))
    }

    fn zigzag(n: usize) -> Vec<Kline> {
        (0..n)
            .map(|i| {
                let close = if i % 3 == 0 { dec!(100) } else { dec!(88) + Decimal::from(i % 5) };
                Kline::from_close(i as i64 * 1_000, close)
            })
            .collect()
    }

    #[test]
    fn rolling_starts_stop_when_the_window_no_longer_fits() {
        assert_eq!(rolling_starts(10, 4, 3).unwrap(), vec![0, 3, 6]);
        assert_eq!(rolling_starts(10, 10, 3).unwrap(), vec![0]);
        assert!(rolling_starts(10, 11, 1).is_err());
        assert!(rolling_starts(10, 0, 1).is_err());
        assert!(rolling_starts(10, 4, 0).is_err());
    }

    #[test]
    fn monte_carlo_starts_are_seeded_and_in_range() {
        let a = monte_carlo_starts(50, 20, 100, 7).unwrap();
        let b = monte_carlo_starts(50, 20, 100, 7).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 100);
        assert!(a.iter().all(|s| *s <= 30));
        assert!(monte_carlo_starts(50, 20, 0, 7).is_err());
        assert!(monte_carlo_starts(5, 20, 3, 7).is_err());
    }

    #[test]
    fn rolling_results_follow_window_order() {
        let klines = zigzag(40);
        let symbol = Symbol("BTCUSDT".into());
        let results = run_rolling(&symbol, &klines, 10, 5, dec!(1000), sizing(), factory).unwrap();

        let starts: Vec<usize> = results.iter().map(|r| r.start_index).collect();
        assert_eq!(starts, vec![0, 5, 10, 15, 20, 25, 30]);
        for r in &results {
            assert_eq!(r.start, klines[r.start_index].open_time);
            assert_eq!(r.end, klines[r.start_index + 9].open_time);
            assert_eq!(r.profit, r.final_value - dec!(1000));
        }
    }

    #[test]
    fn windows_match_a_standalone_backtest() {
        let klines = zigzag(30);
        let symbol = Symbol("BTCUSDT".into());
        let results = run_windows(&symbol, &klines, &[7], 12, dec!(1000), sizing(), factory).unwrap();

        let alone = Backtester::new(symbol, factory().unwrap(), dec!(1000), sizing())
            .run(&klines[7..19])
            .unwrap();
        assert_eq!(results[0].final_value, alone.final_value);
        assert_eq!(results[0].trades, alone.ledger.trades());
    }

    #[test]
    fn monte_carlo_is_reproducible() {
        let klines = zigzag(60);
        let symbol = Symbol("ETHUSDT".into());
        let run = || run_monte_carlo(&symbol, &klines, 15, 25, 99, dec!(1000), sizing(), factory).unwrap();
        assert_eq!(run(), run());
    }

    #[test]
    fn factory_failure_is_reported() {
        let klines = zigzag(20);
        let symbol = Symbol("BTCUSDT".into());
        let failing = || -> anyhow::Result<Box<dyn Strategy + Send>> { anyhow::bail!("no strategy") };
        assert!(run_rolling(&symbol, &klines, 5, 5, dec!(1000), sizing(), failing).is_err());
    }
}
