//! Inventory domain: entities, invariants, errors and storage ports.
//!
//! - [`InventoryItem`] owns the quantity triple and keeps
//!   `available + reserved == total`
//! - [`Warehouse`] is a fulfillment location ranked by priority
//! - [`StockReservation`] is a time-bounded hold with a one-way state machine
//! - [`StockAlert`] flags low and empty stock
//! - one repository trait per entity, with in-memory implementations

pub mod alert;
pub mod error;
pub mod item;
pub mod paging;
pub mod repository;
pub mod reservation;
pub mod warehouse;

pub use alert::{AlertQuery, AlertSeverity, AlertType, StockAlert};
pub use error::{ErrorKind, InventoryError, Result};
pub use item::{InventoryItem, ItemKey, ItemUpdate, NewInventoryItem, StockStatus, derive_status};
pub use paging::{DEFAULT_PAGE_SIZE, Page, PageRequest};
pub use repository::{
    AlertRepository, InMemoryAlertRepository, InMemoryItemRepository,
    InMemoryReservationRepository, InMemoryWarehouseRepository, InventoryItemRepository,
    ItemFilter, ReservationRepository, WarehouseRepository, WarehouseStockTotals,
};
pub use reservation::{ReservationState, ReservationTtl, StockReservation};
pub use warehouse::{Address, CapacityUtilization, NewWarehouse, Warehouse, WarehouseUpdate};
