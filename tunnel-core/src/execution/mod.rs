//! Execution seam: where order requests become fills.
//!
//! The position manager only talks to an [`ExecutionVenue`]. Backtests use
//! [`SimulatedVenue`]; a live broker bridge implements the same trait.

pub mod simulated;

pub use simulated::SimulatedVenue;

use crate::domain::{Fill, OrderRequest};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Broker reject reasons, normalised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectCode {
    Requote,
    InvalidPrice,
    InvalidStops,
    MarketClosed,
    NoMoney,
    Rejected,
    Timeout,
    /// Broker-specific code with no mapping.
    Unknown(i32),
}

impl std::fmt::Display for RejectCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Requote => write!(f, "requote"),
            Self::InvalidPrice => write!(f, "invalid price"),
            Self::InvalidStops => write!(f, "invalid stops"),
            Self::MarketClosed => write!(f, "market closed"),
            Self::NoMoney => write!(f, "not enough money"),
            Self::Rejected => write!(f, "rejected"),
            Self::Timeout => write!(f, "timeout"),
            Self::Unknown(code) => write!(f, "unknown ({code})"),
        }
    }
}

/// Order submission failed at the venue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("order failed: {code}: {message}")]
pub struct ExecutionFailure {
    pub code: RejectCode,
    pub message: String,
}

impl ExecutionFailure {
    pub fn new(code: RejectCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Something that accepts orders and reports fills.
pub trait ExecutionVenue: Send {
    fn submit(
        &mut self,
        order: &OrderRequest,
        time: DateTime<Utc>,
    ) -> Result<Fill, ExecutionFailure>;

    /// Venue name for logging
    fn name(&self) -> &str;
}
