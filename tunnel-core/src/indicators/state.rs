//! Per-bar indicator state: wavy band, tunnel lines and tunnel bounds.

use super::ema::{ema, ema_or_undefined};
use super::tunnel::tunnel_bounds;
use super::IndicatorError;
use crate::domain::PriceBar;
use serde::{Deserialize, Serialize};

/// Smoothing parameters for [`compute_indicator_states`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorParams {
    /// Window for the tunnel bounds (EMA and stddev).
    pub period: usize,
    /// Channel width multiplier applied to the stddev.
    pub deviation_factor: f64,
    /// Window for the short-period wavy band.
    pub wavy_period: usize,
    /// Fast tunnel line period.
    pub fast_period: usize,
    /// Slow tunnel line period.
    pub slow_period: usize,
}

impl IndicatorParams {
    /// Bars needed before every value the signal rule reads is defined.
    pub fn required_bars(&self) -> usize {
        self.period.max(self.wavy_period)
    }
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            period: 20,
            deviation_factor: 1.0,
            wavy_period: 12,
            fast_period: 144,
            slow_period: 169,
        }
    }
}

/// Derived values for one bar. `None` during the warm-up of the relevant window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorState {
    pub fast_ema: Option<f64>,
    pub slow_ema: Option<f64>,
    pub wavy_center: Option<f64>,
    pub wavy_high: Option<f64>,
    pub wavy_low: Option<f64>,
    pub tunnel_upper: Option<f64>,
    pub tunnel_lower: Option<f64>,
}

impl IndicatorState {
    /// True once every value the signal rule reads is defined.
    pub fn is_warm(&self) -> bool {
        self.wavy_high.is_some()
            && self.wavy_low.is_some()
            && self.tunnel_upper.is_some()
            && self.tunnel_lower.is_some()
    }
}

/// Short-period EMA envelope of high, close and low.
#[derive(Debug, Clone, PartialEq)]
pub struct WavyBand {
    pub high: Vec<Option<f64>>,
    pub center: Vec<Option<f64>>,
    pub low: Vec<Option<f64>>,
}

pub fn wavy_band(bars: &[PriceBar], wavy_period: usize) -> Result<WavyBand, IndicatorError> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();

    Ok(WavyBand {
        high: ema(&highs, wavy_period)?,
        center: ema(&closes, wavy_period)?,
        low: ema(&lows, wavy_period)?,
    })
}

/// Compute the indicator state for every bar.
///
/// Fails with `InsufficientData` when there are fewer bars than the tunnel or
/// wavy period. The fast/slow tunnel lines are informational and simply stay
/// `None` if the series never reaches their period.
pub fn compute_indicator_states(
    bars: &[PriceBar],
    params: &IndicatorParams,
) -> Result<Vec<IndicatorState>, IndicatorError> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let bounds = tunnel_bounds(&closes, params.period, params.deviation_factor)?;
    let wavy = wavy_band(bars, params.wavy_period)?;
    let fast = ema_or_undefined(&closes, params.fast_period);
    let slow = ema_or_undefined(&closes, params.slow_period);

    let states = (0..bars.len())
        .map(|i| IndicatorState {
            fast_ema: fast[i],
            slow_ema: slow[i],
            wavy_center: wavy.center[i],
            wavy_high: wavy.high[i],
            wavy_low: wavy.low[i],
            tunnel_upper: bounds.upper[i],
            tunnel_lower: bounds.lower[i],
        })
        .collect();

    Ok(states)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    fn small_params() -> IndicatorParams {
        IndicatorParams {
            period: 3,
            deviation_factor: 1.0,
            wavy_period: 2,
            fast_period: 4,
            slow_period: 50,
        }
    }

    #[test]
    fn states_align_with_bars() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0]);
        let states = compute_indicator_states(&bars, &small_params()).unwrap();
        assert_eq!(states.len(), bars.len());
    }

    #[test]
    fn warmup_follows_longest_required_window() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0]);
        let states = compute_indicator_states(&bars, &small_params()).unwrap();
        // wavy (2) warms at index 1, tunnel (3) at index 2
        assert!(states[1].wavy_high.is_some());
        assert!(states[1].tunnel_upper.is_none());
        assert!(!states[1].is_warm());
        assert!(states[2].is_warm());
    }

    #[test]
    fn slow_line_stays_undefined_on_short_series() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0]);
        let states = compute_indicator_states(&bars, &small_params()).unwrap();
        assert!(states.iter().all(|s| s.slow_ema.is_none()));
        assert!(states[3].fast_ema.is_some());
    }

    #[test]
    fn wavy_band_brackets_center() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 11.5, 13.0, 12.5]);
        let states = compute_indicator_states(&bars, &small_params()).unwrap();
        for s in states.iter().filter(|s| s.wavy_center.is_some()) {
            assert!(s.wavy_high.unwrap() >= s.wavy_center.unwrap());
            assert!(s.wavy_low.unwrap() <= s.wavy_center.unwrap());
        }
    }

    #[test]
    fn too_few_bars_for_wavy_fails() {
        let params = IndicatorParams {
            wavy_period: 10,
            ..small_params()
        };
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0]);
        assert!(matches!(
            compute_indicator_states(&bars, &params),
            Err(IndicatorError::InsufficientData {
                required: 10,
                available: 4
            })
        ));
    }

    #[test]
    fn required_bars_is_max_of_windows() {
        assert_eq!(small_params().required_bars(), 3);
        assert_eq!(IndicatorParams::default().required_bars(), 20);
    }
}
