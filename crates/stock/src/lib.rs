//! Stock ledger: append-only movement log per (product, branch).
//!
//! On-hand quantity is always derivable as the signed sum of recorded
//! movements; the cached value held by a ledger implementation is an
//! optimization, never ground truth.

pub mod ledger;
pub mod movement;
pub mod product;

pub use ledger::{InMemoryStockLedger, Reconciliation, StockLedger};
pub use movement::{
    Direction, MovementReference, MovementType, NewMovement, ReferenceKind, StockMovement,
};
pub use product::{Product, UnitOfMeasure};
