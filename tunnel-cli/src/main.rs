//! Tunnel CLI: run backtests and inspect the latest signal.
//!
//! Commands:
//! - `run`: backtest every symbol in a TOML run config and save artifacts
//! - `signal`: evaluate the tunnel rule on the last bar of a CSV file

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tunnel_core::indicators::{compute_indicator_states, IndicatorState};
use tunnel_core::StrategyConfig;
use tunnel_runner::{load_bars_csv, run_portfolio, save_artifacts, PortfolioResult, RunConfig};

#[derive(Parser)]
#[command(name = "tunnel", about = "Tunnel CLI: EMA tunnel breakout backtester")]
struct Cli {
    /// Log filter used when RUST_LOG is unset (e.g. info, debug, tunnel_core=trace).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest every symbol listed in a TOML run config.
    Run {
        /// Path to the run config.
        #[arg(long)]
        config: PathBuf,

        /// Overrides `[run] output_dir`.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Evaluate the signal for the most recent bar in a CSV file.
    Signal {
        /// CSV file with timestamp,open,high,low,close,volume.
        #[arg(long)]
        data: PathBuf,

        #[arg(long)]
        symbol: String,

        /// Run config whose `[strategy]` section is used. Defaults apply otherwise.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn init_logging(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).compact())
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match cli.command {
        Commands::Run { config, output_dir } => run_cmd(&config, output_dir),
        Commands::Signal {
            data,
            symbol,
            config,
        } => signal_cmd(&data, &symbol, config.as_deref()),
    }
}

fn run_cmd(config_path: &Path, output_dir: Option<PathBuf>) -> Result<()> {
    let config = RunConfig::from_file(config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    let output_dir = output_dir.unwrap_or_else(|| config.run.output_dir.clone());

    let result = run_portfolio(&config)?;
    print_summary(&result);

    if result.reports.is_empty() {
        bail!("no symbol produced a report");
    }

    let run_dir = save_artifacts(&result, &output_dir)?;
    println!("Artifacts saved to: {}", run_dir.display());
    Ok(())
}

fn print_summary(result: &PortfolioResult) {
    println!("Run: {} ({})", result.name, &result.run_id[..12.min(result.run_id.len())]);
    println!();
    println!(
        "{:<10} {:>7} {:>8} {:>12} {:>12} {:>7} {:>7}",
        "Symbol", "Trades", "Win %", "Net", "Equity", "Halted", "Forced"
    );
    println!("{}", "-".repeat(69));
    for report in result.reports.values() {
        let s = &report.summary;
        println!(
            "{:<10} {:>7} {:>7.1}% {:>12.2} {:>12.2} {:>7} {:>7}",
            report.symbol,
            s.total_trades,
            s.win_rate() * 100.0,
            s.net_profit,
            s.ending_equity,
            s.halted_days,
            s.forced_closes
        );
    }
    println!("{}", "-".repeat(69));

    let p = &result.summary;
    println!(
        "{:<10} {:>7} {:>7.1}% {:>12.2}",
        "TOTAL",
        p.total_trades,
        p.win_rate() * 100.0,
        p.net_profit
    );

    for skip in &result.skipped {
        eprintln!("Skipped {}: {}", skip.symbol, skip.reason);
    }
}

fn signal_cmd(data: &Path, symbol: &str, config_path: Option<&Path>) -> Result<()> {
    let strategy = match config_path {
        Some(path) => {
            RunConfig::from_file(path)
                .with_context(|| format!("failed to load {}", path.display()))?
                .strategy
        }
        None => StrategyConfig::default(),
    };
    strategy.validate()?;

    let bars = load_bars_csv(data, symbol)?;
    let states = compute_indicator_states(&bars, &strategy.indicator_params())?;
    let last = bars.len() - 1;

    let rule = strategy.signal_rule();
    let outcome = rule.evaluate_at(&bars, &states, last);
    let extrema = rule.extrema_at(&bars, last);
    let bar = &bars[last];

    println!("{symbol} @ {}  close {:.5}", bar.timestamp.to_rfc3339(), bar.close);
    print_state(&states[last]);
    println!("  {:<14} {}", "last peak", fmt_level(extrema.last_peak()));
    println!("  {:<14} {}", "last dip", fmt_level(extrema.last_dip()));
    println!();
    if outcome.is_conflict() {
        println!("Signal: NONE (conflicting BUY and SELL conditions)");
    } else {
        println!("Signal: {}", outcome.kind());
    }
    Ok(())
}

fn print_state(state: &IndicatorState) {
    let rows = [
        ("wavy high", state.wavy_high),
        ("wavy center", state.wavy_center),
        ("wavy low", state.wavy_low),
        ("tunnel upper", state.tunnel_upper),
        ("tunnel lower", state.tunnel_lower),
        ("fast ema", state.fast_ema),
        ("slow ema", state.slow_ema),
    ];
    for (label, value) in rows {
        println!("  {:<14} {}", label, fmt_level(value));
    }
}

fn fmt_level(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.5}"))
}
