//! Tunnel bounds: EMA +/- deviation factor * rolling standard deviation.
//!
//! - Center: EMA(close, period)
//! - Upper:  center + k * stddev(close, period)
//! - Lower:  center - k * stddev(close, period)
//!
//! Uses population stddev (divide by N) over the trailing `period` closes.
//! Lookback: period - 1.

use super::ema::ema;
use super::{check_len, IndicatorError};

/// Per-bar tunnel bounds, aligned with the input closes.
#[derive(Debug, Clone, PartialEq)]
pub struct TunnelBounds {
    pub center: Vec<Option<f64>>,
    pub upper: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

/// Population standard deviation over a trailing window of `period` values.
pub fn rolling_std(values: &[f64], period: usize) -> Result<Vec<Option<f64>>, IndicatorError> {
    check_len(values.len(), period)?;

    let n = values.len();
    let mut result = vec![None; n];

    for i in (period - 1)..n {
        let window = &values[i + 1 - period..=i];
        if window.iter().any(|v| !v.is_finite()) {
            continue;
        }
        let mean = window.iter().sum::<f64>() / period as f64;
        let variance = window
            .iter()
            .map(|v| {
                let diff = v - mean;
                diff * diff
            })
            .sum::<f64>()
            / period as f64;
        result[i] = Some(variance.sqrt());
    }

    Ok(result)
}

/// Compute tunnel bounds for a close series.
pub fn tunnel_bounds(
    closes: &[f64],
    period: usize,
    deviation_factor: f64,
) -> Result<TunnelBounds, IndicatorError> {
    if !deviation_factor.is_finite() || deviation_factor < 0.0 {
        return Err(IndicatorError::InvalidDeviation(deviation_factor));
    }

    let center = ema(closes, period)?;
    let stddev = rolling_std(closes, period)?;

    let (upper, lower) = center
        .iter()
        .zip(&stddev)
        .map(|(c, s)| match (c, s) {
            (Some(c), Some(s)) => {
                let offset = deviation_factor * s;
                (Some(c + offset), Some(c - offset))
            }
            _ => (None, None),
        })
        .unzip();

    Ok(TunnelBounds {
        center,
        upper,
        lower,
    })
}
