//! Backtesting engine: bar-by-bar replay of one symbol through the strategy.
//!
//! Indicator states are precomputed once, then each bar runs:
//!
//! 1. Date roll: reset daily risk counters on a new calendar day
//! 2. Exits: stop/target check against the bar range
//! 3. Signal: trailing extrema + tunnel rule at the bar close
//! 4. Flip: opposite signal closes the open position at the close
//! 5. Entry: gate, size, prepare, execute
//! 6. Mark-to-market equity
//!
//! The final bar force-closes anything still open.

pub mod backtest;
pub mod daily_risk;

pub use backtest::{BacktestReport, BacktestSummary, Backtester, EngineError, EquityPoint};
pub use daily_risk::{DailyLimits, DailyRiskState, EntryGate, HaltReason};
