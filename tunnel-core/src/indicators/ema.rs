//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1], alpha = 2 / (period + 1)
//! Seed: EMA[period-1] = SMA of first `period` values.
//! Lookback: period - 1.

use super::{check_len, IndicatorError};

/// EMA of an arbitrary series.
///
/// A non-finite value inside the seed window leaves the whole output undefined;
/// one after the seed makes that position and everything after it undefined.
pub fn ema(values: &[f64], period: usize) -> Result<Vec<Option<f64>>, IndicatorError> {
    check_len(values.len(), period)?;

    let n = values.len();
    let mut result = vec![None; n];
    let alpha = 2.0 / (period as f64 + 1.0);

    let seed_window = &values[..period];
    if seed_window.iter().any(|v| !v.is_finite()) {
        return Ok(result);
    }
    let seed = seed_window.iter().sum::<f64>() / period as f64;
    result[period - 1] = Some(seed);

    let mut prev = seed;
    for i in period..n {
        if !values[i].is_finite() {
            // tainted from here on
            break;
        }
        let next = alpha * values[i] + (1.0 - alpha) * prev;
        result[i] = Some(next);
        prev = next;
    }

    Ok(result)
}

/// Like [`ema`], but a series shorter than `period` yields all `None` instead of an error.
///
/// Used for the informational long-period lines, which may legitimately never warm up.
pub(crate) fn ema_or_undefined(values: &[f64], period: usize) -> Vec<Option<f64>> {
    match ema(values, period) {
        Ok(series) => series,
        Err(_) => vec![None; values.len()],
    }
}
