// In crates/analytics/src/report.rs

use crate::types::{ProfitDistribution, RunReport, WindowResult};
use core_types::format_timestamp;

/// Prints the summary and full trade log of a single run.
pub fn print_run_report(report: &RunReport) {
    println!("\n====== Backtest Summary ======");
    println!("Initial budget:   ${:.2}", report.initial_cash);
    println!("Final value:      ${:.2}", report.final_value);
    println!("Net profit:       ${:.2}", report.net_profit);
    println!("Trades executed:  {}", report.trade_count);
    println!("Cash balance:     ${:.2}", report.cash);
    println!("Asset balance:    {:.6}", report.asset_quantity);
    println!("------------------------------");
    println!("Trade log:");
    for trade in &report.trades {
        println!(
            "  [{}] {:12} {:>12.6} at ${:.2}",
            format_timestamp(trade.timestamp),
            trade.action.as_str(),
            trade.quantity,
            trade.price
        );
    }
    println!("==============================\n");
}

/// Prints one line per rolling window followed by the aggregate.
pub fn print_window_results(results: &[WindowResult], distribution: Option<&ProfitDistribution>) {
    println!("\n--- Rolling Window Report ({} runs) ---", results.len());
    for (i, result) in results.iter().enumerate() {
        println!(
            "Run {}: {} -> {} | Profit: ${:.2} | Trades: {}",
            i + 1,
            format_timestamp(result.start),
            format_timestamp(result.end),
            result.profit,
            result.trades.len()
        );
    }
    println!("---------------------------------------");
    if let Some(d) = distribution {
        println!("Total Profit: ${:.2}", d.total);
    }
}

/// Prints the aggregate statistics of a batch of runs.
pub fn print_distribution(title: &str, distribution: &ProfitDistribution) {
    println!("\n--- {title} ---");
    println!("Simulations:     {}", distribution.samples);
    println!("Avg profit:      ${:.2}", distribution.mean);
    println!("Median profit:   ${:.2}", distribution.median);
    println!("Win rate:        {:.2}%", distribution.win_rate_pct);
    println!("Worst loss:      ${:.2}", distribution.worst);
    println!("Best gain:       ${:.2}", distribution.best);
    println!("-----------------------------------");
}
