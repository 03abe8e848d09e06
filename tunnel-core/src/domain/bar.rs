//! PriceBar: the fundamental market data unit.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OHLCV bar for a single symbol at a single timestamp.
///
/// Bars are immutable once produced. A symbol's bar sequence must have strictly
/// increasing timestamps; [`validate_sequence`] enforces this before a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Calendar day used for daily risk accounting.
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    /// Returns true if any OHLC field is NaN or infinite.
    pub fn is_void(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite())
    }

    /// Basic OHLC sanity check: high >= low, high >= open, high >= close, etc.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }

    /// High minus low.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }
}

/// Structural problems in a bar sequence.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BarError {
    #[error("bar {index} at {timestamp} is not after the previous bar")]
    NonIncreasingTimestamp {
        index: usize,
        timestamp: DateTime<Utc>,
    },

    #[error("bar {index} at {timestamp} has inconsistent OHLC values")]
    Insane {
        index: usize,
        timestamp: DateTime<Utc>,
    },
}

/// Check ordering and OHLC sanity of a whole bar sequence.
pub fn validate_sequence(bars: &[PriceBar]) -> Result<(), BarError> {
    for (index, bar) in bars.iter().enumerate() {
        if !bar.is_sane() {
            return Err(BarError::Insane {
                index,
                timestamp: bar.timestamp,
            });
        }
        if index > 0 && bar.timestamp <= bars[index - 1].timestamp {
            return Err(BarError::NonIncreasingTimestamp {
                index,
                timestamp: bar.timestamp,
            });
        }
    }
    Ok(())
}
