//! Tunnel runner: TOML run configs, CSV bar loading, parallel multi-symbol
//! backtests and artifact export.

pub mod config;
pub mod data_loader;
pub mod export;
pub mod runner;

pub use config::{ConfigError, RunConfig, RunId, RunSection, SymbolSource};
pub use data_loader::{dataset_hash, load_bars_csv, parse_bars_csv, parse_timestamp, LoadError};
pub use export::{
    export_equity_csv, export_json, export_ledger_csv, generate_report, import_json,
    load_artifacts, save_artifacts,
};
pub use runner::{
    run_portfolio, run_symbol, PortfolioResult, PortfolioSummary, RunError, SkippedSymbol,
    SCHEMA_VERSION,
};
