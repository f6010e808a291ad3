//! Shared types used by every layer of the stock engine.
//!
//! - Typed identifiers wrapping UUIDs, so an item id can never be passed
//!   where a warehouse id is expected
//! - [`Money`] stored as integer cents
//! - [`Clock`] so that expiry logic can be driven by a manual clock in tests

pub mod clock;
pub mod money;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use money::Money;
pub use types::{
    AlertId, ItemId, MovementId, OrderId, ProductId, ReservationId, VariantId, WarehouseId,
};
