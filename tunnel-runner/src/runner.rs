//! Multi-symbol backtest orchestration.
//!
//! Each symbol is loaded and simulated independently with its own venue and
//! daily risk state, so symbols run in parallel. Symbols that fail to load or
//! are too short are recorded in `skipped` and do not abort the run.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use tunnel_core::execution::SimulatedVenue;
use tunnel_core::{BacktestReport, Backtester, EngineError};

use crate::config::{ConfigError, RunConfig, RunId, SymbolSource};
use crate::data_loader::{dataset_hash, load_bars_csv, LoadError};

/// Current artifact schema version. Bump on breaking changes.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid strategy: {0}")]
    Strategy(#[from] tunnel_core::ConfigError),

    #[error("data error: {0}")]
    Data(#[from] LoadError),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

/// A symbol that was left out of the run, and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: String,
}

/// Totals across every symbol that ran.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub symbols_run: usize,
    pub symbols_skipped: usize,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub net_profit: f64,
    pub forced_closes: usize,
    pub halted_days: usize,
    pub signal_conflicts: usize,
}

impl PortfolioSummary {
    fn aggregate(reports: &BTreeMap<String, BacktestReport>, skipped: usize) -> Self {
        let mut summary = PortfolioSummary {
            symbols_run: reports.len(),
            symbols_skipped: skipped,
            ..Default::default()
        };
        for report in reports.values() {
            let s = &report.summary;
            summary.total_trades += s.total_trades;
            summary.winning_trades += s.winning_trades;
            summary.losing_trades += s.losing_trades;
            summary.net_profit += s.net_profit;
            summary.forced_closes += s.forced_closes;
            summary.halted_days += s.halted_days;
            summary.signal_conflicts += s.signal_conflicts;
        }
        summary
    }

    pub fn win_rate(&self) -> f64 {
        if self.total_trades == 0 {
            0.0
        } else {
            self.winning_trades as f64 / self.total_trades as f64
        }
    }
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Everything produced by one run of a [`RunConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioResult {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub name: String,
    pub config: RunConfig,
    /// Per-symbol reports, keyed and ordered by symbol.
    pub reports: BTreeMap<String, BacktestReport>,
    /// BLAKE3 of each symbol's loaded bars.
    pub dataset_hashes: BTreeMap<String, String>,
    #[serde(default)]
    pub skipped: Vec<SkippedSymbol>,
    pub summary: PortfolioSummary,
}

/// Load and backtest a single symbol.
pub fn run_symbol(
    backtester: &Backtester,
    source: &SymbolSource,
) -> Result<(BacktestReport, String), RunError> {
    let bars = load_bars_csv(&source.path, &source.symbol)?;
    let hash = dataset_hash(&bars);
    let mut venue = SimulatedVenue::new();
    let report = backtester.run(&source.symbol, &bars, &mut venue)?;
    Ok((report, hash))
}

/// Run every symbol in the config.
///
/// Fails only on configuration problems; per-symbol failures end up in
/// [`PortfolioResult::skipped`].
pub fn run_portfolio(config: &RunConfig) -> Result<PortfolioResult, RunError> {
    config.validate()?;
    let run_id = config.run_id()?;
    let backtester = Backtester::new(config.strategy.clone())?;
    let short_id = run_id.get(..12).unwrap_or(&run_id);

    info!(
        run = %config.run.name,
        run_id = short_id,
        symbols = config.symbols.len(),
        "portfolio run started"
    );

    let outcomes: Vec<(String, Result<(BacktestReport, String), RunError>)> = config
        .symbols
        .par_iter()
        .map(|source| (source.symbol.clone(), run_symbol(&backtester, source)))
        .collect();

    let mut reports = BTreeMap::new();
    let mut dataset_hashes = BTreeMap::new();
    let mut skipped = Vec::new();

    for (symbol, outcome) in outcomes {
        match outcome {
            Ok((report, hash)) => {
                dataset_hashes.insert(symbol.clone(), hash);
                reports.insert(symbol, report);
            }
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "symbol skipped");
                skipped.push(SkippedSymbol {
                    symbol,
                    reason: e.to_string(),
                });
            }
        }
    }

    let summary = PortfolioSummary::aggregate(&reports, skipped.len());
    info!(
        run = %config.run.name,
        symbols_run = summary.symbols_run,
        symbols_skipped = summary.symbols_skipped,
        trades = summary.total_trades,
        net_profit = summary.net_profit,
        "portfolio run finished"
    );

    Ok(PortfolioResult {
        schema_version: SCHEMA_VERSION,
        run_id,
        name: config.run.name.clone(),
        config: config.clone(),
        reports,
        dataset_hashes,
        skipped,
        summary,
    })
}
