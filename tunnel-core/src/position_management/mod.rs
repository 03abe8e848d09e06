//! Position management: one symbol, one position, one lifecycle at a time.
//!
//! **Lifecycle:** `Flat → Pending → Open → Closed`, then `reset()` back to `Flat`.
//!
//! **Key invariants:**
//! 1. At most one open position per manager (no hedging, no pyramiding)
//! 2. Orders go through an [`ExecutionVenue`](crate::execution::ExecutionVenue), never direct fills
//! 3. A failed market order is retried exactly once as a resting order
//! 4. Stop wins when stop and target are both touched in the same bar
pub mod manager;

pub use manager::{EntryOutcome, PmError, PmSettings, PmState, PositionManager, PriceLevels};
