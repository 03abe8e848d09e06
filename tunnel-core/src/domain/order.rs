//! Order requests sent to an execution venue, and the fills it returns.

use super::position::Direction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How the venue should work the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    /// Fill immediately at the prevailing price.
    Market,
    /// Resting order at `entry_price` or better.
    Limit,
    /// Resting order triggered once price trades through `entry_price`.
    Stop,
}

/// Everything a venue needs to open a position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub direction: Direction,
    pub kind: OrderKind,
    pub size: f64,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    /// Free-text tag carried to the broker.
    pub comment: String,
    /// Numeric strategy tag carried to the broker.
    pub magic: u64,
}

impl OrderRequest {
    /// Same request re-issued as a resting order of `kind`.
    pub fn as_pending(&self, kind: OrderKind) -> Self {
        Self {
            kind,
            ..self.clone()
        }
    }
}

/// Fill confirmation returned by a venue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub price: f64,
    pub size: f64,
    pub time: DateTime<Utc>,
}
