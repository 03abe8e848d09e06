//! Indicator calculator: exponential smoothing and the channel derived from it.
//!
//! Everything here is a pure function of the input series and its parameters.
//! Outputs are aligned 1:1 with the input; warm-up positions are `None`.
//! No value at index t depends on input after t, so the full series can be
//! precomputed once before the bar loop.

pub mod ema;
pub mod state;
pub mod tunnel;

pub use ema::ema;
pub use state::{compute_indicator_states, wavy_band, IndicatorParams, IndicatorState, WavyBand};
pub use tunnel::{rolling_std, tunnel_bounds, TunnelBounds};

use thiserror::Error;

/// Errors from indicator computation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndicatorError {
    #[error("insufficient data: need at least {required} values, got {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("smoothing period must be >= 1")]
    InvalidPeriod,

    #[error("deviation factor must be finite and >= 0, got {0}")]
    InvalidDeviation(f64),
}

pub(crate) fn check_len(len: usize, period: usize) -> Result<(), IndicatorError> {
    if period == 0 {
        return Err(IndicatorError::InvalidPeriod);
    }
    if len < period {
        return Err(IndicatorError::InsufficientData {
            required: period,
            available: len,
        });
    }
    Ok(())
}

/// Create synthetic bars from close prices for testing.
///
/// open = prev_close (or close for first bar), high = max(open,close) + 1.0,
/// low = min(open,close) - 1.0, hourly timestamps.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<crate::domain::PriceBar> {
    use chrono::TimeZone;
    let base = chrono::Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            crate::domain::PriceBar::new(
                base + chrono::Duration::hours(i as i64),
                open,
                open.max(close) + 1.0,
                open.min(close) - 1.0,
                close,
                1000.0,
            )
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
