//! Position Sizers: determine trade volume in lots
//!
//! Sizers translate a risk budget into a lot size. They are account-aware
//! (use equity) but signal-agnostic (never look at the signal direction).

pub mod pip_risk;

pub use pip_risk::{LotLimits, PipRiskSizer};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SizingError {
    #[error("invalid risk parameters: {0}")]
    InvalidRiskParameters(String),

    #[error("invalid lot limits: {0}")]
    InvalidLotLimits(String),
}

/// Position sizing logic
///
/// # Responsibilities
/// - Convert equity + stop distance → lot size
/// - Respect broker volume limits (min, max, step)
///
/// # Non-Responsibilities
/// - Sizers do NOT decide entry/exit (that's the signal's job)
/// - Sizers do NOT place orders (that's the position manager's job)
pub trait Sizer: Send + Sync {
    /// Lot size for a trade risking a stop `stop_distance_pips` away.
    fn size(&self, equity: f64, stop_distance_pips: f64) -> Result<f64, SizingError>;

    /// Sizer name for logging
    fn name(&self) -> &str;
}
