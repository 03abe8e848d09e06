/// Position manager state machine
///
/// Owns the pending order and the open position for a single symbol and
/// turns venue responses and bar ranges into ledger entries.
use crate::domain::{
    Direction, ExitReason, OrderKind, OrderRequest, PipSpec, Position, PriceBar, TradeLedgerEntry,
};
use crate::execution::{ExecutionFailure, ExecutionVenue};
use crate::signals::{SignalKind, TradeSignal};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PmState {
    Flat,
    /// Order prepared, not yet accepted by the venue.
    Pending,
    Open,
    /// Terminal until `reset()`.
    Closed,
}

impl std::fmt::Display for PmState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PmState::Flat => "flat",
            PmState::Pending => "pending",
            PmState::Open => "open",
            PmState::Closed => "closed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PmError {
    #[error("cannot {action} while {state}")]
    InvalidTransition { action: &'static str, state: PmState },

    #[error("signal at bar {0} carries no direction")]
    NoDirection(usize),

    #[error("order size must be > 0, got {0}")]
    InvalidSize(f64),

    #[error("entry price must be finite and > 0, got {0}")]
    InvalidPrice(f64),
}

/// Stop and target distances, in pips from the entry price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceLevels {
    pub stop_loss_pips: f64,
    pub take_profit_pips: f64,
}

impl PriceLevels {
    pub fn new(stop_loss_pips: f64, take_profit_pips: f64) -> Self {
        Self {
            stop_loss_pips,
            take_profit_pips,
        }
    }

    /// `(stop_loss, take_profit)` prices for an entry at `entry`.
    pub fn resolve(&self, direction: Direction, entry: f64, pips: &PipSpec) -> (f64, f64) {
        let sign = direction.sign();
        let stop = entry - sign * pips.offset(self.stop_loss_pips);
        let target = entry + sign * pips.offset(self.take_profit_pips);
        (stop, target)
    }
}

/// Static settings for a manager.
#[derive(Debug, Clone, PartialEq)]
pub struct PmSettings {
    pub symbol: String,
    pub pips: PipSpec,
    /// Resting order type used when the market order fails.
    pub fallback_kind: OrderKind,
    pub comment: String,
    pub magic: u64,
}

/// What happened when a pending order was sent to the venue.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryOutcome {
    Opened {
        position: Position,
        via_fallback: bool,
    },
    /// Both the market order and the fallback failed; the position was never
    /// held and is archived with zero profit.
    Forced {
        entry: TradeLedgerEntry,
        failures: Vec<ExecutionFailure>,
    },
}

impl EntryOutcome {
    pub fn is_opened(&self) -> bool {
        matches!(self, EntryOutcome::Opened { .. })
    }
}

#[derive(Debug, Clone)]
pub struct PositionManager {
    settings: PmSettings,
    state: PmState,
    pending: Option<OrderRequest>,
    position: Option<Position>,
}

impl PositionManager {
    pub fn new(settings: PmSettings) -> Self {
        Self {
            settings,
            state: PmState::Flat,
            pending: None,
            position: None,
        }
    }

    pub fn state(&self) -> PmState {
        self.state
    }

    pub fn settings(&self) -> &PmSettings {
        &self.settings
    }

    pub fn is_open(&self) -> bool {
        self.state == PmState::Open
    }

    /// The open position, or the last closed one until `reset()`.
    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn pending_order(&self) -> Option<&OrderRequest> {
        self.pending.as_ref()
    }

    /// Direction of the open position, if any.
    pub fn open_direction(&self) -> Option<Direction> {
        if self.is_open() {
            self.position.as_ref().map(|p| p.direction)
        } else {
            None
        }
    }

    /// Mark-to-market profit of the open position at `price`. Zero when not open.
    pub fn unrealized_profit(&self, price: f64) -> f64 {
        match (&self.position, self.state) {
            (Some(p), PmState::Open) => p.profit_at(price, &self.settings.pips),
            _ => 0.0,
        }
    }

    /// Build a market order for `signal`. Flat → Pending.
    pub fn prepare_entry(
        &mut self,
        signal: &TradeSignal,
        size: f64,
        levels: &PriceLevels,
    ) -> Result<&OrderRequest, PmError> {
        if self.state != PmState::Flat {
            return Err(PmError::InvalidTransition {
                action: "prepare an entry",
                state: self.state,
            });
        }
        let direction = match signal.kind {
            SignalKind::Buy => Direction::Long,
            SignalKind::Sell => Direction::Short,
            SignalKind::None => return Err(PmError::NoDirection(signal.bar_index)),
        };
        if !(size.is_finite() && size > 0.0) {
            return Err(PmError::InvalidSize(size));
        }
        let entry = signal.close;
        if !(entry.is_finite() && entry > 0.0) {
            return Err(PmError::InvalidPrice(entry));
        }

        let (stop_loss, take_profit) = levels.resolve(direction, entry, &self.settings.pips);
        let order = OrderRequest {
            symbol: self.settings.symbol.clone(),
            direction,
            kind: OrderKind::Market,
            size,
            entry_price: entry,
            stop_loss,
            take_profit,
            comment: self.settings.comment.clone(),
            magic: self.settings.magic,
        };

        self.position = None;
        self.state = PmState::Pending;
        Ok(&*self.pending.insert(order))
    }

    /// Send the pending order. Pending → Open, or Pending → Closed (forced).
    ///
    /// A rejected market order is re-sent once as a resting order of the
    /// configured fallback kind at the same price.
    pub fn execute(
        &mut self,
        venue: &mut dyn ExecutionVenue,
        time: DateTime<Utc>,
    ) -> Result<EntryOutcome, PmError> {
        let order = match (self.state, self.pending.take()) {
            (PmState::Pending, Some(order)) => order,
            (state, pending) => {
                self.pending = pending;
                return Err(PmError::InvalidTransition {
                    action: "execute",
                    state,
                });
            }
        };

        let first = match venue.submit(&order, time) {
            Ok(fill) => return Ok(self.open_from(&order, fill.price, fill.size, fill.time, false)),
            Err(failure) => failure,
        };
        warn!(
            symbol = %order.symbol,
            venue = venue.name(),
            code = %first.code,
            message = %first.message,
            fallback = ?self.settings.fallback_kind,
            "market order failed, retrying as pending order"
        );

        let fallback = order.as_pending(self.settings.fallback_kind);
        let second = match venue.submit(&fallback, time) {
            Ok(fill) => {
                return Ok(self.open_from(&fallback, fill.price, fill.size, fill.time, true))
            }
            Err(failure) => failure,
        };
        error!(
            symbol = %order.symbol,
            venue = venue.name(),
            code = %second.code,
            message = %second.message,
            "fallback order failed, forcing position closed"
        );

        let position = Position {
            symbol: order.symbol.clone(),
            direction: order.direction,
            entry_price: order.entry_price,
            size: order.size,
            stop_loss: order.stop_loss,
            take_profit: order.take_profit,
            open_time: time,
            close_time: Some(time),
            realized_profit: Some(0.0),
        };
        let entry = TradeLedgerEntry::from_position(
            &position,
            order.entry_price,
            time,
            0.0,
            ExitReason::Forced,
        );
        self.position = Some(position);
        self.state = PmState::Closed;

        Ok(EntryOutcome::Forced {
            entry,
            failures: vec![first, second],
        })
    }

    /// Check the bar against stop and target. Open → Closed on a hit.
    pub fn on_bar(&mut self, bar: &PriceBar) -> Option<TradeLedgerEntry> {
        let position = self.position.as_ref().filter(|_| self.is_open())?;

        // worst case: a bar touching both levels is treated as a stop-out
        let (price, reason) = if position.stop_hit(bar.low, bar.high) {
            (position.stop_exit_price(bar.open), ExitReason::Stop)
        } else if position.target_hit(bar.low, bar.high) {
            (position.take_profit, ExitReason::Target)
        } else {
            return None;
        };

        self.close(price, bar.timestamp, reason)
    }

    /// Close the open position at `price`. Open → Closed. `None` when nothing is open.
    pub fn close(
        &mut self,
        price: f64,
        time: DateTime<Utc>,
        reason: ExitReason,
    ) -> Option<TradeLedgerEntry> {
        if !self.is_open() {
            return None;
        }
        let pips = self.settings.pips;
        let position = self.position.as_mut()?;

        let profit = position.profit_at(price, &pips);
        position.close_time = Some(time);
        position.realized_profit = Some(profit);
        self.state = PmState::Closed;

        debug!(
            symbol = %position.symbol,
            direction = ?position.direction,
            exit_price = price,
            profit,
            reason = %reason,
            "position closed"
        );

        Some(TradeLedgerEntry::from_position(
            position, price, time, profit, reason,
        ))
    }

    /// Start a fresh cycle. Refuses while a position is open or an order is pending.
    pub fn reset(&mut self) -> Result<(), PmError> {
        match self.state {
            PmState::Open | PmState::Pending => Err(PmError::InvalidTransition {
                action: "reset",
                state: self.state,
            }),
            PmState::Flat | PmState::Closed => {
                self.state = PmState::Flat;
                self.pending = None;
                self.position = None;
                Ok(())
            }
        }
    }

    fn open_from(
        &mut self,
        order: &OrderRequest,
        price: f64,
        size: f64,
        time: DateTime<Utc>,
        via_fallback: bool,
    ) -> EntryOutcome {
        let position = Position {
            symbol: order.symbol.clone(),
            direction: order.direction,
            entry_price: price,
            size,
            stop_loss: order.stop_loss,
            take_profit: order.take_profit,
            open_time: time,
            close_time: None,
            realized_profit: None,
        };
        debug!(
            symbol = %position.symbol,
            direction = ?position.direction,
            entry_price = price,
            size,
            kind = ?order.kind,
            "position opened"
        );
        self.position = Some(position.clone());
        self.state = PmState::Open;
        EntryOutcome::Opened {
            position,
            via_fallback,
        }
    }
}
