//! Position: a single open trade on one symbol.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Side of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// +1.0 for long, -1.0 for short.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
        }
    }
}

/// Converts price distance into account currency.
///
/// `pip_size` is the price increment of one pip (0.0001 on most FX pairs);
/// `pip_value` is the monetary value of one pip for one lot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipSpec {
    pub pip_size: f64,
    pub pip_value: f64,
}

impl PipSpec {
    pub fn new(pip_size: f64, pip_value: f64) -> Self {
        Self {
            pip_size,
            pip_value,
        }
    }

    /// Number of pips between two prices (unsigned direction is caller's business).
    pub fn pips(&self, price_delta: f64) -> f64 {
        price_delta / self.pip_size
    }

    /// Price distance of `pips` pips.
    pub fn offset(&self, pips: f64) -> f64 {
        pips * self.pip_size
    }
}

/// An open (or just-closed) position.
///
/// Exactly one position per symbol may be open at a time; no hedging or
/// pyramiding. `close_time` and `realized_profit` are set on close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub size: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub open_time: DateTime<Utc>,
    pub close_time: Option<DateTime<Utc>>,
    pub realized_profit: Option<f64>,
}

impl Position {
    pub fn is_long(&self) -> bool {
        self.direction == Direction::Long
    }

    pub fn is_short(&self) -> bool {
        self.direction == Direction::Short
    }

    pub fn is_closed(&self) -> bool {
        self.close_time.is_some()
    }

    /// Profit in account currency if the position were closed at `price`.
    pub fn profit_at(&self, price: f64, pips: &PipSpec) -> f64 {
        let delta = (price - self.entry_price) * self.direction.sign();
        pips.pips(delta) * pips.pip_value * self.size
    }

    /// Whether the bar range `[low, high]` reaches the stop.
    pub fn stop_hit(&self, low: f64, high: f64) -> bool {
        match self.direction {
            Direction::Long => low <= self.stop_loss,
            Direction::Short => high >= self.stop_loss,
        }
    }

    /// Exit price for a stop hit on a bar opening at `open`.
    ///
    /// A bar that opens through the stop fills at its open, not at the stop.
    pub fn stop_exit_price(&self, open: f64) -> f64 {
        match self.direction {
            Direction::Long => open.min(self.stop_loss),
            Direction::Short => open.max(self.stop_loss),
        }
    }

    /// Whether the bar range `[low, high]` reaches the target.
    pub fn target_hit(&self, low: f64, high: f64) -> bool {
        match self.direction {
            Direction::Long => high >= self.take_profit,
            Direction::Short => low <= self.take_profit,
        }
    }
}
