//! Single-symbol backtest loop.

use super::daily_risk::{DailyLimits, DailyRiskState, EntryGate};
use crate::config::{ConfigError, StrategyConfig};
use crate::domain::{validate_sequence, BarError, Direction, ExitReason, PriceBar, TradeLedgerEntry};
use crate::execution::ExecutionVenue;
use crate::indicators::{compute_indicator_states, IndicatorError};
use crate::position_management::{EntryOutcome, PmError, PmSettings, PositionManager};
use crate::signals::{SignalKind, TradeSignal, TunnelSignal};
use crate::sizers::{PipRiskSizer, Sizer};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid bar sequence: {0}")]
    InvalidBars(#[from] BarError),

    #[error("insufficient data: need more than {required} bars, got {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("indicator error: {0}")]
    Indicator(#[from] IndicatorError),

    #[error("position manager error: {0}")]
    PositionManager(#[from] PmError),
}

/// Equity at one bar close, including open profit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub equity: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BacktestSummary {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// Sum of winning trade profits.
    pub total_profit: f64,
    /// Sum of losing trade losses, as a positive number.
    pub total_loss: f64,
    pub net_profit: f64,
    pub starting_equity: f64,
    pub ending_equity: f64,
    /// Whether the daily halt flag was raised on any day.
    pub max_drawdown_hit: bool,
    /// Days on which at least one entry was blocked.
    pub halted_days: usize,
    pub forced_closes: usize,
    pub signal_conflicts: usize,
    pub sizing_rejections: usize,
    pub buy_signals: usize,
    pub sell_signals: usize,
    pub bars_processed: usize,
}

impl BacktestSummary {
    pub fn win_rate(&self) -> f64 {
        if self.total_trades == 0 {
            0.0
        } else {
            self.winning_trades as f64 / self.total_trades as f64
        }
    }

    fn tally(&mut self, ledger: &[TradeLedgerEntry]) {
        self.total_trades = ledger.len();
        for entry in ledger {
            if entry.is_winner() {
                self.winning_trades += 1;
                self.total_profit += entry.profit;
            } else if entry.is_loser() {
                self.losing_trades += 1;
                self.total_loss += -entry.profit;
            }
        }
        self.net_profit = self.total_profit - self.total_loss;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    pub symbol: String,
    pub ledger: Vec<TradeLedgerEntry>,
    pub equity_curve: Vec<EquityPoint>,
    pub summary: BacktestSummary,
}

/// Replays bars for one symbol. Holds no per-run state, so one instance can
/// run many symbols.
#[derive(Debug, Clone)]
pub struct Backtester {
    config: StrategyConfig,
    sizer: PipRiskSizer,
    rule: TunnelSignal,
}

/// Mutable state of a single run.
struct RunState {
    pm: PositionManager,
    risk: DailyRiskState,
    limits: DailyLimits,
    ledger: Vec<TradeLedgerEntry>,
    summary: BacktestSummary,
}

impl RunState {
    fn book(&mut self, entry: TradeLedgerEntry) -> Result<(), PmError> {
        if let Some(reason) = self.risk.record_close(entry.profit, &self.limits) {
            self.summary.max_drawdown_hit = true;
            warn!(
                symbol = %entry.symbol,
                date = ?self.risk.date(),
                %reason,
                loss_today = self.risk.cumulative_loss_today(),
                equity = self.risk.equity(),
                "daily halt raised"
            );
        }
        self.ledger.push(entry);
        self.pm.reset()
    }
}

impl Backtester {
    pub fn new(config: StrategyConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let sizer = PipRiskSizer::new(config.risk_per_trade, config.pip_value, config.lot_limits())
            .map_err(|e| ConfigError::OutOfRange {
                field: "sizing",
                reason: e.to_string(),
            })?;
        let rule = config.signal_rule();
        Ok(Self {
            config,
            sizer,
            rule,
        })
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    pub fn run(
        &self,
        symbol: &str,
        bars: &[PriceBar],
        venue: &mut dyn ExecutionVenue,
    ) -> Result<BacktestReport, EngineError> {
        validate_sequence(bars)?;

        let params = self.config.indicator_params();
        let required = params.required_bars();
        if bars.len() <= required {
            return Err(EngineError::InsufficientData {
                required,
                available: bars.len(),
            });
        }

        info!(symbol, bars = bars.len(), venue = venue.name(), "backtest started");

        let states = compute_indicator_states(bars, &params)?;

        let mut run = RunState {
            pm: PositionManager::new(PmSettings {
                symbol: symbol.to_string(),
                pips: self.config.pip_spec(),
                fallback_kind: self.config.fallback_order.into(),
                comment: self.config.order_comment.clone(),
                magic: self.config.magic,
            }),
            risk: DailyRiskState::new(self.config.starting_equity),
            limits: self.config.daily_limits(),
            ledger: Vec::new(),
            summary: BacktestSummary {
                starting_equity: self.config.starting_equity,
                ..Default::default()
            },
        };
        let mut equity_curve = Vec::with_capacity(bars.len());
        let last = bars.len() - 1;

        for (i, bar) in bars.iter().enumerate() {
            if run.risk.roll_to(bar.date()) {
                debug!(symbol, date = %bar.date(), equity = run.risk.equity(), "new trading day");
            }

            if let Some(entry) = run.pm.on_bar(bar) {
                run.book(entry)?;
            }

            let outcome = self.rule.evaluate_at(bars, &states, i);
            if outcome.is_conflict() {
                run.summary.signal_conflicts += 1;
                warn!(symbol, bar = i, close = bar.close, "conflicting buy and sell signal, ignored");
            }
            let signal = outcome.signal();

            if let Some(wanted) = entry_direction(&signal) {
                match wanted {
                    Direction::Long => run.summary.buy_signals += 1,
                    Direction::Short => run.summary.sell_signals += 1,
                }

                if run.pm.open_direction() == Some(wanted.opposite()) {
                    if let Some(entry) = run.pm.close(bar.close, bar.timestamp, ExitReason::SignalFlip) {
                        run.book(entry)?;
                    }
                }

                if !run.pm.is_open() && i < last {
                    self.try_enter(&mut run, &signal, bar, venue)?;
                }
            }

            equity_curve.push(EquityPoint {
                timestamp: bar.timestamp,
                equity: run.risk.equity() + run.pm.unrealized_profit(bar.close),
            });
        }

        let final_bar = &bars[last];
        if let Some(entry) = run.pm.close(final_bar.close, final_bar.timestamp, ExitReason::Eod) {
            run.book(entry)?;
        }

        run.summary.bars_processed = bars.len();
        run.summary.ending_equity = run.risk.equity();
        let ledger = run.ledger;
        run.summary.tally(&ledger);

        info!(
            symbol,
            trades = run.summary.total_trades,
            net_profit = run.summary.net_profit,
            ending_equity = run.summary.ending_equity,
            halted_days = run.summary.halted_days,
            "backtest finished"
        );

        Ok(BacktestReport {
            symbol: symbol.to_string(),
            ledger,
            equity_curve,
            summary: run.summary,
        })
    }

    fn try_enter(
        &self,
        run: &mut RunState,
        signal: &TradeSignal,
        bar: &PriceBar,
        venue: &mut dyn ExecutionVenue,
    ) -> Result<(), EngineError> {
        if let EntryGate::Blocked(reason) = run.risk.gate(&run.limits) {
            if run.risk.mark_blocked() {
                run.summary.halted_days += 1;
                info!(
                    symbol = %run.pm.settings().symbol,
                    date = %bar.date(),
                    %reason,
                    "entries blocked for the rest of the day"
                );
            }
            return Ok(());
        }

        let size = match self.sizer.size(run.risk.equity(), self.config.stop_loss_pips) {
            Ok(size) => size,
            Err(e) => {
                run.summary.sizing_rejections += 1;
                warn!(
                    symbol = %run.pm.settings().symbol,
                    sizer = self.sizer.name(),
                    error = %e,
                    "entry skipped"
                );
                return Ok(());
            }
        };

        run.pm.prepare_entry(signal, size, &self.config.price_levels())?;
        match run.pm.execute(venue, bar.timestamp)? {
            EntryOutcome::Opened { .. } => run.risk.record_entry(),
            EntryOutcome::Forced { entry, .. } => {
                run.summary.forced_closes += 1;
                run.book(entry)?;
            }
        }
        Ok(())
    }
}

fn entry_direction(signal: &TradeSignal) -> Option<Direction> {
    match signal.kind {
        SignalKind::Buy => Some(Direction::Long),
        SignalKind::Sell => Some(Direction::Short),
        SignalKind::None => None,
    }
}
