//! Ports to systems outside the inventory engine.

pub mod catalog;
pub mod orders;

pub use catalog::{InMemoryProductCatalog, ProductCatalog};
pub use orders::{AllocationNotice, InMemoryOrderSystem, OrderSystem, StockStatusUpdate};
