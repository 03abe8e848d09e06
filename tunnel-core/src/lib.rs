//! Tunnel Core: indicators, signal rule, sizing, position lifecycle and the backtest loop.
//!
//! This crate contains the strategy engine:
//! - Domain types (bars, orders, fills, positions, ledger entries)
//! - EMA, rolling deviation and the tunnel/wavy bands
//! - Extrema detection and the tunnel breakout rule
//! - Pip-risk position sizing
//! - Position state machine behind an execution venue seam
//! - Daily risk gate and the single-symbol backtester
//!
//! Everything here is synchronous and deterministic. No I/O, no global state.

pub mod config;
pub mod domain;
pub mod engine;
pub mod execution;
pub mod indicators;
pub mod position_management;
pub mod signals;
pub mod sizers;

pub use config::{ConfigError, FallbackOrder, StrategyConfig};
pub use engine::{BacktestReport, BacktestSummary, Backtester, EngineError, EquityPoint};
