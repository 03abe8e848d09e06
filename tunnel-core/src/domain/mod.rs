//! Domain types for the tunnel engine

pub mod bar;
pub mod order;
pub mod position;
pub mod trade;

pub use bar::{validate_sequence, BarError, PriceBar};
pub use order::{Fill, OrderKind, OrderRequest};
pub use position::{Direction, PipSpec, Position};
pub use trade::{ExitReason, TradeLedgerEntry};

/// Symbol type alias
pub type Symbol = String;
