//! Strategy configuration: every tunable of a run in one value object.
//!
//! Deserializes from TOML/JSON with every field optional; missing fields take
//! the defaults below. [`StrategyConfig::validate`] must pass before a run.

use crate::domain::{OrderKind, PipSpec};
use crate::engine::DailyLimits;
use crate::indicators::IndicatorParams;
use crate::position_management::PriceLevels;
use crate::signals::TunnelSignal;
use crate::sizers::LotLimits;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be >= 1, got {value}")]
    InvalidPeriod { field: &'static str, value: usize },

    #[error("{field} must be finite and > 0, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("{field} is out of range: {reason}")]
    OutOfRange { field: &'static str, reason: String },
}

/// Resting order type used when a market order is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackOrder {
    #[default]
    Limit,
    Stop,
}

impl From<FallbackOrder> for OrderKind {
    fn from(f: FallbackOrder) -> Self {
        match f {
            FallbackOrder::Limit => OrderKind::Limit,
            FallbackOrder::Stop => OrderKind::Stop,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StrategyConfig {
    // ── Indicators ──
    pub period: usize,
    pub deviation_factor: f64,
    pub wavy_period: usize,
    pub fast_period: usize,
    pub slow_period: usize,

    // ── Extrema ──
    pub peak_type: usize,
    pub extrema_lookback: usize,

    // ── Sizing ──
    pub risk_per_trade: f64,
    pub pip_value: f64,
    pub pip_size: f64,
    pub stop_loss_pips: f64,
    pub take_profit_pips: f64,
    pub min_lot: f64,
    pub max_lot: f64,
    pub lot_step: f64,

    // ── Daily risk ──
    pub max_trades_per_day: u32,
    pub max_loss_per_day: f64,
    pub starting_equity: f64,
    pub equity_floor_fraction: f64,

    // ── Orders ──
    pub fallback_order: FallbackOrder,
    pub order_comment: String,
    pub magic: u64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            period: 20,
            deviation_factor: 1.0,
            wavy_period: 12,
            fast_period: 144,
            slow_period: 169,
            peak_type: 5,
            extrema_lookback: 100,
            risk_per_trade: 0.01,
            pip_value: 10.0,
            pip_size: 0.0001,
            stop_loss_pips: 20.0,
            take_profit_pips: 40.0,
            min_lot: 0.01,
            max_lot: 100.0,
            lot_step: 0.01,
            max_trades_per_day: 5,
            max_loss_per_day: 1000.0,
            starting_equity: 10_000.0,
            equity_floor_fraction: 0.0,
            fallback_order: FallbackOrder::Limit,
            order_comment: "Tunnel Strategy".into(),
            magic: 12345,
        }
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn period(field: &'static str, value: usize) -> Result<(), ConfigError> {
    if value >= 1 {
        Ok(())
    } else {
        Err(ConfigError::InvalidPeriod { field, value })
    }
}

impl StrategyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        period("period", self.period)?;
        period("wavy_period", self.wavy_period)?;
        period("fast_period", self.fast_period)?;
        period("slow_period", self.slow_period)?;
        period("extrema_lookback", self.extrema_lookback)?;

        // the wavy band must not extend the tunnel warm-up
        if self.wavy_period > self.period {
            return Err(ConfigError::OutOfRange {
                field: "wavy_period",
                reason: format!("{} exceeds period {}", self.wavy_period, self.period),
            });
        }

        if !(self.deviation_factor.is_finite() && self.deviation_factor >= 0.0) {
            return Err(ConfigError::OutOfRange {
                field: "deviation_factor",
                reason: format!("must be finite and >= 0, got {}", self.deviation_factor),
            });
        }
        if !(self.risk_per_trade > 0.0 && self.risk_per_trade < 1.0) {
            return Err(ConfigError::OutOfRange {
                field: "risk_per_trade",
                reason: format!("must be in (0, 1), got {}", self.risk_per_trade),
            });
        }

        positive("pip_value", self.pip_value)?;
        positive("pip_size", self.pip_size)?;
        positive("stop_loss_pips", self.stop_loss_pips)?;
        positive("take_profit_pips", self.take_profit_pips)?;
        positive("min_lot", self.min_lot)?;
        positive("max_lot", self.max_lot)?;
        positive("lot_step", self.lot_step)?;
        positive("max_loss_per_day", self.max_loss_per_day)?;
        positive("starting_equity", self.starting_equity)?;

        if self.max_lot < self.min_lot {
            return Err(ConfigError::OutOfRange {
                field: "max_lot",
                reason: format!("{} is below min_lot {}", self.max_lot, self.min_lot),
            });
        }
        if self.max_trades_per_day == 0 {
            return Err(ConfigError::OutOfRange {
                field: "max_trades_per_day",
                reason: "must be >= 1".into(),
            });
        }
        if !(0.0..1.0).contains(&self.equity_floor_fraction) {
            return Err(ConfigError::OutOfRange {
                field: "equity_floor_fraction",
                reason: format!("must be in [0, 1), got {}", self.equity_floor_fraction),
            });
        }
        Ok(())
    }

    pub fn indicator_params(&self) -> IndicatorParams {
        IndicatorParams {
            period: self.period,
            deviation_factor: self.deviation_factor,
            wavy_period: self.wavy_period,
            fast_period: self.fast_period,
            slow_period: self.slow_period,
        }
    }

    pub fn signal_rule(&self) -> TunnelSignal {
        TunnelSignal::new(self.peak_type, self.extrema_lookback)
    }

    pub fn pip_spec(&self) -> PipSpec {
        PipSpec::new(self.pip_size, self.pip_value)
    }

    pub fn lot_limits(&self) -> LotLimits {
        LotLimits {
            min_lot: self.min_lot,
            max_lot: self.max_lot,
            lot_step: self.lot_step,
        }
    }

    pub fn price_levels(&self) -> PriceLevels {
        PriceLevels::new(self.stop_loss_pips, self.take_profit_pips)
    }

    pub fn daily_limits(&self) -> DailyLimits {
        DailyLimits {
            max_trades_per_day: self.max_trades_per_day,
            max_loss_per_day: self.max_loss_per_day,
            starting_equity: self.starting_equity,
            equity_floor_fraction: self.equity_floor_fraction,
        }
    }
}
