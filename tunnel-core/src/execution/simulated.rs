//! In-process venue for backtests.

use super::{ExecutionFailure, ExecutionVenue};
use crate::domain::{Fill, OrderRequest};
use chrono::{DateTime, Utc};
use std::collections::VecDeque;

/// Fills every order at its requested price and size.
///
/// Failures queued with [`SimulatedVenue::fail_next`] are returned, in order,
/// before any further fills.
#[derive(Debug, Clone, Default)]
pub struct SimulatedVenue {
    queued_failures: VecDeque<ExecutionFailure>,
    submitted: Vec<OrderRequest>,
}

impl SimulatedVenue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next submission with `failure`.
    pub fn fail_next(&mut self, failure: ExecutionFailure) -> &mut Self {
        self.queued_failures.push_back(failure);
        self
    }

    /// Every order seen so far, including rejected ones.
    pub fn submitted(&self) -> &[OrderRequest] {
        &self.submitted
    }
}

impl ExecutionVenue for SimulatedVenue {
    fn submit(
        &mut self,
        order: &OrderRequest,
        time: DateTime<Utc>,
    ) -> Result<Fill, ExecutionFailure> {
        self.submitted.push(order.clone());
        if let Some(failure) = self.queued_failures.pop_front() {
            return Err(failure);
        }
        Ok(Fill {
            price: order.entry_price,
            size: order.size,
            time,
        })
    }

    fn name(&self) -> &str {
        "simulated"
    }
}
