//! Tunnel breakout rule.
//!
//! BUY when the close clears the wavy high, both tunnel bounds and the most
//! recent peak. SELL is the mirror image on the wavy low, the bounds and the
//! most recent dip. Anything else, including any undefined input, is NONE.

use super::extrema::{detect_extrema, ExtremaSet};
use crate::domain::PriceBar;
use crate::indicators::IndicatorState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Discrete decision for one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalKind {
    Buy,
    Sell,
    None,
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
            Self::None => write!(f, "NONE"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeSignal {
    pub kind: SignalKind,
    pub bar_index: usize,
    pub timestamp: DateTime<Utc>,
    pub close: f64,
}

impl TradeSignal {
    pub fn is_entry(&self) -> bool {
        self.kind != SignalKind::None
    }
}

/// Everything the rule reads for one bar.
#[derive(Debug, Clone, Copy)]
pub struct SignalInputs<'a> {
    pub bar_index: usize,
    pub timestamp: DateTime<Utc>,
    pub close: f64,
    pub state: &'a IndicatorState,
    pub extrema: &'a ExtremaSet,
}

/// Result of evaluating the rule.
///
/// `Conflict` means both sides qualified at once. It carries a NONE signal and
/// is reported separately so callers can log and count it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SignalOutcome {
    Decided(TradeSignal),
    Conflict(TradeSignal),
}

impl SignalOutcome {
    pub fn signal(&self) -> TradeSignal {
        match self {
            Self::Decided(s) | Self::Conflict(s) => *s,
        }
    }

    pub fn kind(&self) -> SignalKind {
        self.signal().kind
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

/// Evaluate the breakout rule. Pure.
pub fn evaluate_signal(inputs: &SignalInputs<'_>) -> SignalOutcome {
    let state = inputs.state;
    let close = inputs.close;

    let (wavy_high, wavy_low, upper, lower) = match (
        state.wavy_high,
        state.wavy_low,
        state.tunnel_upper,
        state.tunnel_lower,
    ) {
        (Some(wh), Some(wl), Some(u), Some(l)) if close.is_finite() => (wh, wl, u, l),
        _ => return SignalOutcome::Decided(signal_of(inputs, SignalKind::None)),
    };

    // no prior peak means no resistance to clear; same for dips
    let above_resistance = inputs.extrema.last_peak().map_or(true, |p| p < close);
    let below_support = inputs.extrema.last_dip().map_or(true, |d| d > close);

    let buy = close > wavy_high && close > upper && close > lower && above_resistance;
    let sell = close < wavy_low && close < lower && close < upper && below_support;

    resolve(inputs, buy, sell)
}

fn resolve(inputs: &SignalInputs<'_>, buy: bool, sell: bool) -> SignalOutcome {
    match (buy, sell) {
        (true, true) => SignalOutcome::Conflict(signal_of(inputs, SignalKind::None)),
        (true, false) => SignalOutcome::Decided(signal_of(inputs, SignalKind::Buy)),
        (false, true) => SignalOutcome::Decided(signal_of(inputs, SignalKind::Sell)),
        (false, false) => SignalOutcome::Decided(signal_of(inputs, SignalKind::None)),
    }
}

fn signal_of(inputs: &SignalInputs<'_>, kind: SignalKind) -> TradeSignal {
    TradeSignal {
        kind,
        bar_index: inputs.bar_index,
        timestamp: inputs.timestamp,
        close: inputs.close,
    }
}

/// Rule bound to its extrema parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunnelSignal {
    /// Minimum bar distance between emitted extrema.
    pub peak_type: usize,
    /// Number of trailing bars (ending at the evaluated bar) scanned for extrema.
    pub extrema_lookback: usize,
}

impl TunnelSignal {
    pub fn new(peak_type: usize, extrema_lookback: usize) -> Self {
        Self {
            peak_type,
            extrema_lookback,
        }
    }

    /// Extrema over the trailing window ending at `index`.
    pub fn extrema_at(&self, bars: &[PriceBar], index: usize) -> ExtremaSet {
        if bars.is_empty() {
            return ExtremaSet::default();
        }
        let end = index.min(bars.len() - 1);
        let start = (end + 1).saturating_sub(self.extrema_lookback.max(1));
        let window = &bars[start..=end];
        let highs: Vec<f64> = window.iter().map(|b| b.high).collect();
        let lows: Vec<f64> = window.iter().map(|b| b.low).collect();
        detect_extrema(&highs, &lows, self.peak_type)
    }

    /// Evaluate the rule at bar `index`. Only reads `bars[..=index]`.
    ///
    /// Returns NONE when `index` is outside either slice.
    pub fn evaluate_at(
        &self,
        bars: &[PriceBar],
        states: &[IndicatorState],
        index: usize,
    ) -> SignalOutcome {
        let (Some(bar), Some(state)) = (bars.get(index), states.get(index)) else {
            let timestamp = bars.last().map(|b| b.timestamp).unwrap_or_default();
            return SignalOutcome::Decided(TradeSignal {
                kind: SignalKind::None,
                bar_index: index,
                timestamp,
                close: f64::NAN,
            });
        };

        let extrema = self.extrema_at(bars, index);
        evaluate_signal(&SignalInputs {
            bar_index: index,
            timestamp: bar.timestamp,
            close: bar.close,
            state,
            extrema: &extrema,
        })
    }
}
