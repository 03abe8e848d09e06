//! TradeLedgerEntry: an archived, closed position.

use super::position::{Direction, Position};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a position was closed. Exactly one reason is recorded per trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    Stop,
    Target,
    SignalFlip,
    Eod,
    Forced,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExitReason::Stop => "STOP",
            ExitReason::Target => "TARGET",
            ExitReason::SignalFlip => "SIGNAL_FLIP",
            ExitReason::Eod => "EOD",
            ExitReason::Forced => "FORCED",
        };
        f.write_str(s)
    }
}

/// Immutable record appended to the ledger when a position closes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeLedgerEntry {
    // ── Identification ──
    pub symbol: String,
    pub direction: Direction,

    // ── Entry ──
    pub entry_price: f64,
    pub entry_time: DateTime<Utc>,

    // ── Exit ──
    pub exit_price: f64,
    pub exit_time: DateTime<Utc>,

    // ── Size / PnL ──
    pub size: f64,
    pub profit: f64,

    pub exit_reason: ExitReason,
}

impl TradeLedgerEntry {
    /// Archive a position that was closed at `exit_price`.
    pub fn from_position(
        position: &Position,
        exit_price: f64,
        exit_time: DateTime<Utc>,
        profit: f64,
        exit_reason: ExitReason,
    ) -> Self {
        Self {
            symbol: position.symbol.clone(),
            direction: position.direction,
            entry_price: position.entry_price,
            entry_time: position.open_time,
            exit_price,
            exit_time,
            size: position.size,
            profit,
            exit_reason,
        }
    }

    pub fn is_winner(&self) -> bool {
        self.profit > 0.0
    }

    pub fn is_loser(&self) -> bool {
        self.profit < 0.0
    }
}
