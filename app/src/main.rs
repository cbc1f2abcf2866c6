// In app/src/main.rs

use analytics::report::{print_distribution, print_run_report, print_window_results};
use analytics::{AnalyticsEngine, WindowResult};
use anyhow::{Context, Result};
use app_config::{RunSettings, Settings};
use backtester::{Backtester, Simulation, SizingRules};
use chrono::{TimeZone, Utc};
use clap::{Parser, Subcommand};
use core_types::{format_timestamp, Kline, StrategyConfig, Symbol};
use engine::LiveTrader;
use events::{BroadcastSink, EngineEvent, TracingSink};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use strategies::Strategy;
use tokio::sync::{broadcast, watch};
use tokio::task;
use tokio::time::sleep;
use tracing_subscriber::prelude::*;

const DAY_MILLIS: i64 = 86_400_000;

// --- Command-Line Interface Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = "A crypto strategy backtester and paper trader.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs the configured strategy once over a CSV price history.
    Backtest {
        /// CSV file with columns date,open,high,low,close,volume.
        #[arg(short, long)]
        data: PathBuf,

        /// Optional CSV file to write the trade log to.
        #[arg(long)]
        trades_out: Option<PathBuf>,
    },

    /// Runs the strategy over consecutive windows of the history.
    Rolling {
        #[arg(short, long)]
        data: PathBuf,

        /// Window length in bars. Defaults to `windows.window_len`.
        #[arg(long)]
        window_len: Option<usize>,

        /// Bars between window starts. Defaults to `windows.step`.
        #[arg(long)]
        step: Option<usize>,
    },

    /// Runs the strategy over randomly placed windows of the history.
    MonteCarlo {
        #[arg(short, long)]
        data: PathBuf,

        #[arg(long)]
        window_len: Option<usize>,

        #[arg(long)]
        simulations: Option<usize>,

        #[arg(long)]
        seed: Option<u64>,
    },

    /// Paper-trades the configured strategy against live prices until Ctrl-C.
    Live {
        /// Overrides `live.symbol`.
        #[arg(short, long)]
        symbol: Option<String>,
    },

    /// Downloads daily history from Binance into a CSV file.
    Export {
        #[arg(short, long)]
        symbol: String,

        /// The interval for the klines (e.g., "1h", "1d").
        #[arg(short, long, default_value = "1d")]
        interval: String,

        /// How many days back from now to fetch.
        #[arg(long)]
        days: u32,

        #[arg(short, long)]
        out: PathBuf,
    },
}

// --- Main Application Entry Point ---

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from a .env file, if it exists.
    dotenvy::dotenv().ok();

    // Parse command-line arguments.
    let cli = Cli::parse();
    let settings = app_config::load_settings().context("Failed to load settings")?;

    // --- Tracing Setup ---
    let level = settings
        .app
        .log_level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::INFO);
    let fmt_layer = tracing_subscriber::fmt::layer().with_filter(
        tracing_subscriber::filter::Targets::new()
            .with_target("reqwest", tracing::Level::WARN)
            .with_target("hyper", tracing::Level::WARN)
            .with_default(level),
    );
    tracing_subscriber::registry().with(fmt_layer).init();

    tracing::info!(environment = %settings.app.environment, "Starting application");

    match cli.command {
        Commands::Backtest { data, trades_out } => {
            handle_backtest(settings, data, trades_out).await?;
        }
        Commands::Rolling { data, window_len, step } => {
            handle_rolling(settings, data, window_len, step).await?;
        }
        Commands::MonteCarlo {
            data,
            window_len,
            simulations,
            seed,
        } => {
            handle_monte_carlo(settings, data, window_len, simulations, seed).await?;
        }
        Commands::Live { symbol } => {
            handle_live(settings, symbol).await?;
        }
        Commands::Export {
            symbol,
            interval,
            days,
            out,
        } => {
            handle_export(settings, symbol, interval, days, out).await?;
        }
    }

    tracing::info!("Application has finished successfully.");
    Ok(())
}

fn sizing_rules(run: &RunSettings) -> SizingRules {
    SizingRules {
        buy_fraction_of_cash: run.buy_fraction_of_cash,
        minimum_trade_notional: run.minimum_trade_notional,
    }
}

fn build_strategy(config: &StrategyConfig) -> Result<Box<dyn Strategy + Send>> {
    strategies::create_strategy(config).with_context(|| format!("Failed to build strategy '{}'", config.name))
}

fn load_data(path: PathBuf) -> Result<Vec<Kline>> {
    let klines = market_data::load_klines(&path)
        .with_context(|| format!("Failed to load price history from {}", path.display()))?;
    tracing::info!(bars = klines.len(), path = %path.display(), "Loaded price history.");
    Ok(klines)
}

// --- "Backtest" Subcommand Logic ---

async fn handle_backtest(settings: Settings, data: PathBuf, trades_out: Option<PathBuf>) -> Result<()> {
    let klines = load_data(data)?;
    let strategy = build_strategy(&settings.strategy)?;
    let backtester = Backtester::new(
        Symbol(settings.live.symbol.clone()),
        strategy,
        settings.run.initial_cash,
        sizing_rules(&settings.run),
    );

    let outcome = task::spawn_blocking(move || backtester.run(&klines)).await??;
    print_run_report(&outcome.report());

    if let Some(path) = trades_out {
        market_data::save_trades(&path, outcome.trades())
            .with_context(|| format!("Failed to write trades to {}", path.display()))?;
        tracing::info!(path = %path.display(), trades = outcome.trades().len(), "Trade log written.");
    }
    Ok(())
}

// --- Windowed Subcommand Logic ---

fn summarize(results: &[WindowResult]) -> Option<analytics::ProfitDistribution> {
    let profits: Vec<_> = results.iter().map(|r| r.profit).collect();
    AnalyticsEngine::new().profit_distribution(&profits)
}

async fn handle_rolling(
    settings: Settings,
    data: PathBuf,
    window_len: Option<usize>,
    step: Option<usize>,
) -> Result<()> {
    let klines = load_data(data)?;
    let window_len = window_len.unwrap_or(settings.windows.window_len);
    let step = step.unwrap_or(settings.windows.step);
    let start_time = Instant::now();

    let results = task::spawn_blocking(move || {
        let strategy = settings.strategy.clone();
        backtester::run_rolling(
            &Symbol(settings.live.symbol.clone()),
            &klines,
            window_len,
            step,
            settings.run.initial_cash,
            sizing_rules(&settings.run),
            || build_strategy(&strategy),
        )
    })
    .await??;

    let distribution = summarize(&results);
    print_window_results(&results, distribution.as_ref());
    if let Some(d) = &distribution {
        print_distribution("Rolling Window Summary", d);
    }
    tracing::info!(duration = ?start_time.elapsed(), "Rolling run finished.");
    Ok(())
}

async fn handle_monte_carlo(
    settings: Settings,
    data: PathBuf,
    window_len: Option<usize>,
    simulations: Option<usize>,
    seed: Option<u64>,
) -> Result<()> {
    let klines = load_data(data)?;
    let window_len = window_len.unwrap_or(settings.windows.window_len);
    let simulations = simulations.unwrap_or(settings.windows.simulations);
    let seed = seed.unwrap_or(settings.windows.seed);
    let start_time = Instant::now();

    let results = task::spawn_blocking(move || {
        let strategy = settings.strategy.clone();
        backtester::run_monte_carlo(
            &Symbol(settings.live.symbol.clone()),
            &klines,
            window_len,
            simulations,
            seed,
            settings.run.initial_cash,
            sizing_rules(&settings.run),
            || build_strategy(&strategy),
        )
    })
    .await??;

    match summarize(&results) {
        Some(d) => print_distribution("Monte Carlo Summary", &d),
        None => println!("No Monte Carlo runs were produced."),
    }
    tracing::info!(duration = ?start_time.elapsed(), "Monte Carlo run finished.");
    Ok(())
}

// --- "Live" Subcommand Logic ---

async fn handle_live(settings: Settings, symbol: Option<String>) -> Result<()> {
    let symbol = Symbol(symbol.unwrap_or_else(|| settings.live.symbol.clone()));
    let api_client = api_client::new(&settings.binance)?;

    let simulation = Simulation::new(
        build_strategy(&settings.strategy)?,
        settings.run.initial_cash,
        sizing_rules(&settings.run),
    );
    // Logs go through tracing; executed trades are also echoed to the console.
    let trade_sink = BroadcastSink::new(256);
    let trade_feed = tokio::spawn(print_trade_feed(trade_sink.subscribe()));

    let trader = LiveTrader::new(
        symbol,
        simulation,
        Arc::new(api_client),
        Arc::new((TracingSink, trade_sink)),
        Duration::from_secs(settings.live.poll_interval_secs),
    );

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl-C received. Stopping after the current tick.");
            let _ = stop_tx.send(true);
        }
    });

    let summary = trader.run(stop_rx).await?;
    // The trader owned the last sender, so the feed drains and ends.
    trade_feed.await?;

    println!("\n====== Live Session Summary ======");
    println!("Ticks:            {}", summary.ticks);
    println!("Trades executed:  {}", summary.trades.len());
    println!("Cash balance:     ${:.2}", summary.cash);
    println!("Asset balance:    {:.6}", summary.asset_quantity);
    match summary.value {
        Some(value) => println!("Portfolio value:  ${:.2}", value),
        None => println!("Portfolio value:  n/a (no price observed)"),
    }
    println!("==================================\n");
    Ok(())
}

/// Prints each executed trade until the channel closes.
async fn print_trade_feed(mut rx: broadcast::Receiver<EngineEvent>) {
    loop {
        match rx.recv().await {
            Ok(EngineEvent::TradeExecuted { trade, cash, .. }) => {
                println!(
                    "[{}] {:12} {:>12.6} at ${:.2} | cash ${:.2}",
                    format_timestamp(trade.timestamp),
                    trade.action.as_str(),
                    trade.quantity,
                    trade.price,
                    cash
                );
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Trade feed fell behind.");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

// --- "Export" Subcommand Logic ---

async fn handle_export(settings: Settings, symbol: String, interval: String, days: u32, out: PathBuf) -> Result<()> {
    if days == 0 {
        anyhow::bail!("--days must be at least 1");
    }

    let api_client = api_client::new(&settings.binance)?;
    let symbol = Symbol(symbol);
    let end_time = Utc::now().timestamp_millis();
    let mut cursor = end_time - i64::from(days) * DAY_MILLIS;
    let mut klines: Vec<Kline> = Vec::new();

    tracing::info!(%symbol, %interval, days, "Starting export.");

    // --- Fetch forward until the range is covered ---
    loop {
        let batch = api_client
            .get_historical_klines(&symbol, &interval, Some(cursor), Some(end_time), Some(1000))
            .await?;

        let Some(last) = batch.last() else {
            break;
        };
        let next_cursor = last.open_time + 1;
        tracing::info!(
            count = batch.len(),
            to = %Utc.timestamp_millis_opt(last.open_time).single().unwrap_or_default(),
            "Received klines."
        );
        klines.extend(batch);

        if next_cursor > end_time {
            break;
        }
        cursor = next_cursor;
        sleep(Duration::from_millis(500)).await;
    }

    if klines.is_empty() {
        anyhow::bail!("Binance returned no klines for {symbol} {interval}");
    }

    market_data::save_klines(&out, &klines)
        .with_context(|| format!("Failed to write klines to {}", out.display()))?;
    tracing::info!(bars = klines.len(), path = %out.display(), "Export complete.");
    Ok(())
}
