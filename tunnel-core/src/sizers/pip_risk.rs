//! Pip Risk Sizer
//!
//! Lot size from a fixed fraction of equity and a stop distance in pips.

use super::{Sizer, SizingError};
use serde::{Deserialize, Serialize};

// Absorbs representation error before flooring to the lot step.
const STEP_EPSILON: f64 = 1e-9;

/// Broker volume constraints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LotLimits {
    pub min_lot: f64,
    pub max_lot: f64,
    pub lot_step: f64,
}

impl Default for LotLimits {
    fn default() -> Self {
        Self {
            min_lot: 0.01,
            max_lot: 100.0,
            lot_step: 0.01,
        }
    }
}

/// Fixed-fractional pip risk sizer
///
/// # Formula
/// ```text
/// risk_amount = equity * risk_fraction
/// raw_lots    = risk_amount / (stop_distance_pips * pip_value)
/// lots        = floor_to_step(clamp(raw_lots, min_lot, max_lot)), never below min_lot
/// ```
///
/// # Example
/// - Equity: 10,000
/// - Risk per trade: 1% (100)
/// - Stop: 30 pips at 10.0 per pip per lot
/// - Raw: 100 / 300 = 0.3333 lots → 0.33 with a 0.01 step
#[derive(Debug, Clone, PartialEq)]
pub struct PipRiskSizer {
    risk_fraction: f64,
    pip_value: f64,
    limits: LotLimits,
}

impl PipRiskSizer {
    pub fn new(risk_fraction: f64, pip_value: f64, limits: LotLimits) -> Result<Self, SizingError> {
        if !(risk_fraction.is_finite() && risk_fraction > 0.0) {
            return Err(SizingError::InvalidRiskParameters(format!(
                "risk fraction must be > 0, got {risk_fraction}"
            )));
        }
        if !(pip_value.is_finite() && pip_value > 0.0) {
            return Err(SizingError::InvalidLotLimits(format!(
                "pip value must be > 0, got {pip_value}"
            )));
        }
        if !(limits.min_lot.is_finite() && limits.min_lot > 0.0) {
            return Err(SizingError::InvalidLotLimits(format!(
                "min_lot must be > 0, got {}",
                limits.min_lot
            )));
        }
        if !(limits.max_lot.is_finite() && limits.max_lot >= limits.min_lot) {
            return Err(SizingError::InvalidLotLimits(format!(
                "max_lot ({}) must be >= min_lot ({})",
                limits.max_lot, limits.min_lot
            )));
        }
        if !(limits.lot_step.is_finite() && limits.lot_step > 0.0) {
            return Err(SizingError::InvalidLotLimits(format!(
                "lot_step must be > 0, got {}",
                limits.lot_step
            )));
        }

        Ok(Self {
            risk_fraction,
            pip_value,
            limits,
        })
    }

    pub fn risk_fraction(&self) -> f64 {
        self.risk_fraction
    }

    pub fn limits(&self) -> LotLimits {
        self.limits
    }

    fn floor_to_step(&self, lots: f64) -> f64 {
        let step = self.limits.lot_step;
        let steps = (lots / step + STEP_EPSILON).floor();
        let floored = steps * step;
        floored.max(self.limits.min_lot)
    }
}

impl Sizer for PipRiskSizer {
    fn size(&self, equity: f64, stop_distance_pips: f64) -> Result<f64, SizingError> {
        if !(stop_distance_pips.is_finite() && stop_distance_pips > 0.0) {
            return Err(SizingError::InvalidRiskParameters(format!(
                "stop distance must be > 0 pips, got {stop_distance_pips}"
            )));
        }
        if !(equity.is_finite() && equity > 0.0) {
            return Err(SizingError::InvalidRiskParameters(format!(
                "equity must be > 0, got {equity}"
            )));
        }

        let risk_amount = equity * self.risk_fraction;
        let raw = risk_amount / (stop_distance_pips * self.pip_value);
        let clamped = raw.clamp(self.limits.min_lot, self.limits.max_lot);

        Ok(self.floor_to_step(clamped))
    }

    fn name(&self) -> &str {
        "PipRisk"
    }
}
