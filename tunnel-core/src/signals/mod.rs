//! Signal generation: extrema detection and the tunnel breakout rule.
//!
//! Signals never see position or account state. They read bars, precomputed
//! indicator states and the extrema found in a trailing window.

pub mod extrema;
pub mod tunnel;

pub use extrema::{detect_extrema, extrema_indices, ExtremaSet};
pub use tunnel::{
    evaluate_signal, SignalInputs, SignalKind, SignalOutcome, TradeSignal, TunnelSignal,
};
