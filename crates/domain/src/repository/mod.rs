//! Storage ports, one per entity.
//!
//! Implementations must be thread-safe and are held as `Arc<dyn Trait>` by
//! the services. Quantity mutations are serialized above this layer; the
//! item repository adds a version check on update as a second line of defence.

mod memory;

pub use memory::{
    InMemoryAlertRepository, InMemoryItemRepository, InMemoryReservationRepository,
    InMemoryWarehouseRepository,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{AlertId, ItemId, OrderId, ProductId, ReservationId, VariantId, WarehouseId};
use serde::{Deserialize, Serialize};

use crate::{
    AlertQuery, AlertType, InventoryItem, ItemKey, Page, PageRequest, Result, StockAlert,
    StockReservation, StockStatus, Warehouse,
};

/// Filter for listing inventory items.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemFilter {
    pub warehouse_id: Option<WarehouseId>,
    pub product_id: Option<ProductId>,
    /// Any of these statuses.
    pub statuses: Option<Vec<StockStatus>>,
}

impl ItemFilter {
    pub fn warehouse(warehouse_id: WarehouseId) -> Self {
        Self {
            warehouse_id: Some(warehouse_id),
            ..Default::default()
        }
    }

    pub fn product(product_id: ProductId) -> Self {
        Self {
            product_id: Some(product_id),
            ..Default::default()
        }
    }

    pub fn statuses(statuses: Vec<StockStatus>) -> Self {
        Self {
            statuses: Some(statuses),
            ..Default::default()
        }
    }

    pub fn matches(&self, item: &InventoryItem) -> bool {
        if let Some(warehouse_id) = self.warehouse_id
            && item.warehouse_id() != warehouse_id
        {
            return false;
        }
        if let Some(product_id) = self.product_id
            && item.product_id() != product_id
        {
            return false;
        }
        if let Some(ref statuses) = self.statuses
            && !statuses.contains(&item.status())
        {
            return false;
        }
        true
    }
}

/// Quantity totals of every item stored at a warehouse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseStockTotals {
    pub items: u64,
    pub quantity_available: u64,
    pub quantity_reserved: u64,
    pub quantity_total: u64,
}

#[async_trait]
pub trait InventoryItemRepository: Send + Sync {
    /// Stores a new item. Fails with `DuplicateItem` if its key is taken.
    async fn insert(&self, item: InventoryItem) -> Result<()>;

    async fn get(&self, id: ItemId) -> Result<Option<InventoryItem>>;

    async fn get_by_key(&self, key: &ItemKey) -> Result<Option<InventoryItem>>;

    async fn find_by_sku(&self, sku: &str) -> Result<Vec<InventoryItem>>;

    async fn find_by_barcode(&self, barcode: &str) -> Result<Vec<InventoryItem>>;

    /// Every item holding exactly this product variant, across warehouses.
    async fn find_for_product(
        &self,
        product_id: ProductId,
        variant_id: Option<VariantId>,
    ) -> Result<Vec<InventoryItem>>;

    /// Lists items ordered by creation time.
    async fn list(&self, filter: &ItemFilter, page: PageRequest) -> Result<Page<InventoryItem>>;

    /// Replaces a stored item if its stored version is `expected_version`.
    ///
    /// Fails with `ConcurrencyConflict` otherwise, or `InventoryNotFound` if
    /// the item is gone.
    async fn update(&self, item: &InventoryItem, expected_version: u64) -> Result<()>;

    /// Returns false if nothing was deleted.
    async fn delete(&self, id: ItemId) -> Result<bool>;

    async fn warehouse_totals(&self, warehouse_id: WarehouseId) -> Result<WarehouseStockTotals>;
}

#[async_trait]
pub trait WarehouseRepository: Send + Sync {
    /// Stores a new warehouse. Fails with `DuplicateWarehouse` if the code is taken.
    async fn insert(&self, warehouse: Warehouse) -> Result<()>;

    async fn get(&self, id: WarehouseId) -> Result<Option<Warehouse>>;

    async fn get_by_code(&self, code: &str) -> Result<Option<Warehouse>>;

    /// Lists warehouses by ascending priority, then code.
    async fn list(&self, active_only: bool) -> Result<Vec<Warehouse>>;

    async fn update(&self, warehouse: &Warehouse) -> Result<()>;

    async fn delete(&self, id: WarehouseId) -> Result<bool>;
}

#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Stores a new reservation. Fails with `DuplicateReservation` if the code is taken.
    async fn insert(&self, reservation: StockReservation) -> Result<()>;

    async fn get(&self, id: ReservationId) -> Result<Option<StockReservation>>;

    async fn get_by_code(&self, code: &str) -> Result<Option<StockReservation>>;

    async fn find_by_order(&self, order_id: OrderId) -> Result<Vec<StockReservation>>;

    async fn find_by_item(&self, item_id: ItemId, active_only: bool) -> Result<Vec<StockReservation>>;

    /// Active reservations whose expiry is before `now`, oldest expiry first.
    async fn find_expired(&self, now: DateTime<Utc>, limit: usize) -> Result<Vec<StockReservation>>;

    async fn update(&self, reservation: &StockReservation) -> Result<()>;
}

#[async_trait]
pub trait AlertRepository: Send + Sync {
    async fn insert(&self, alert: StockAlert) -> Result<()>;

    async fn get(&self, id: AlertId) -> Result<Option<StockAlert>>;

    /// Lists matching alerts, newest first.
    async fn find(&self, query: &AlertQuery) -> Result<Page<StockAlert>>;

    async fn has_unresolved(&self, item_id: ItemId, alert_type: AlertType) -> Result<bool>;

    async fn update(&self, alert: &StockAlert) -> Result<()>;

    /// Deletes resolved alerts created before `cutoff`.
    async fn delete_resolved_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;
}
