//! Stock reservation engine services.
//!
//! [`InventoryEngine`] wires the item store operations, the warehouse
//! registry, the allocation planner, the reservation manager and the alert
//! generator over shared storage ports. Quantity mutations on an item are
//! serialized through [`ItemLocks`] and every one of them is written to the
//! movement ledger.

pub mod alerts;
pub mod allocation;
pub mod context;
pub mod engine;
pub mod items;
pub mod locks;
pub mod reports;
pub mod requests;
pub mod reservations;
pub mod scheduler;
pub mod services;
pub mod warehouses;

pub use alerts::{AlertDedupPolicy, AlertGenerator, AlertScanReport};
pub use allocation::{AllocationLine, AllocationPlanner, Availability, WarehouseStock, plan_allocation};
pub use context::InventoryContext;
pub use engine::{EngineSettings, InventoryEngine, InventoryEngineBuilder};
pub use items::{ItemService, ReconcileReport, TransferResult};
pub use locks::{ItemGuard, ItemLocks};
pub use reports::{ProductMovementStats, ReportService, WarehouseSummary};
pub use requests::{
    AdjustStockRequest, AvailabilityRequest, BulkAdjustLine, BulkAdjustRequest, BulkOutcome,
    BulkReserveLine, BulkReserveRequest, LineOutcome, ReserveRequest, TransferRequest,
};
pub use reservations::{ReservationManager, SweepReport};
pub use scheduler::{MaintenanceScheduler, ScheduleSettings, SchedulerHandle};
pub use services::{
    AllocationNotice, InMemoryOrderSystem, InMemoryProductCatalog, OrderSystem, ProductCatalog,
    StockStatusUpdate,
};
pub use warehouses::{CapacityReport, WarehouseRegistry};
