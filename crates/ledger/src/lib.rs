//! Movement ledger: the audit trail of every stock quantity change.
//!
//! The ledger is a pure sink. It validates the shape of a movement (the
//! before/after quantities must agree with the signed quantity) but never
//! looks at business state; callers record a movement alongside the item
//! mutation it describes.

pub mod error;
pub mod memory;
pub mod movement;
pub mod postgres;
pub mod query;
pub mod store;
pub mod summary;

pub use error::{LedgerError, Result};
pub use memory::InMemoryMovementStore;
pub use movement::{MovementBuilder, MovementType, StockMovement, reference};
pub use postgres::PostgresMovementStore;
pub use query::MovementQuery;
pub use store::{MovementStore, MovementStoreExt, MovementStream, validate_movement};
pub use summary::{DailyMovementStats, ItemMovementStats, MovementSummary, Replay};
