//! Inventory items: per-(product, variant, warehouse) quantity records.

mod status;

pub use status::{StockStatus, derive_status};

use chrono::{DateTime, Utc};
use common::{ItemId, Money, ProductId, VariantId, WarehouseId};
use serde::{Deserialize, Serialize};

use crate::{InventoryError, Result};

/// Natural key of an inventory item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemKey {
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub warehouse_id: WarehouseId,
}

impl ItemKey {
    pub fn new(
        product_id: ProductId,
        variant_id: Option<VariantId>,
        warehouse_id: WarehouseId,
    ) -> Self {
        Self {
            product_id,
            variant_id,
            warehouse_id,
        }
    }
}

/// Input for creating an inventory item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInventoryItem {
    pub product_id: ProductId,
    #[serde(default)]
    pub variant_id: Option<VariantId>,
    pub warehouse_id: WarehouseId,
    #[serde(default)]
    pub initial_quantity: u32,
    #[serde(default)]
    pub min_stock_level: u32,
    pub max_stock_level: u32,
    #[serde(default)]
    pub reorder_point: u32,
    pub sku: String,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub cost_price: Money,
}

impl NewInventoryItem {
    pub fn key(&self) -> ItemKey {
        ItemKey::new(self.product_id, self.variant_id, self.warehouse_id)
    }

    /// Rejects malformed input before anything touches storage.
    pub fn validate(&self) -> Result<()> {
        if self.max_stock_level < 1 {
            return Err(InventoryError::validation("max_stock_level must be at least 1"));
        }
        if self.sku.trim().is_empty() {
            return Err(InventoryError::validation("sku is required"));
        }
        if self.cost_price.is_negative() {
            return Err(InventoryError::validation("cost_price must not be negative"));
        }
        if !self.cost_price.fits_any_quantity() {
            return Err(InventoryError::validation("cost_price is too large"));
        }
        Ok(())
    }
}

/// Partial update of an item's descriptive fields and thresholds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemUpdate {
    pub min_stock_level: Option<u32>,
    pub max_stock_level: Option<u32>,
    pub reorder_point: Option<u32>,
    pub location: Option<String>,
    pub barcode: Option<String>,
    pub cost_price: Option<Money>,
}

impl ItemUpdate {
    pub fn validate(&self) -> Result<()> {
        if self.max_stock_level == Some(0) {
            return Err(InventoryError::validation("max_stock_level must be at least 1"));
        }
        if self.cost_price.is_some_and(|c| c.is_negative()) {
            return Err(InventoryError::validation("cost_price must not be negative"));
        }
        if self.cost_price.is_some_and(|c| !c.fits_any_quantity()) {
            return Err(InventoryError::validation("cost_price is too large"));
        }
        Ok(())
    }
}

/// Stock held for one product variant at one warehouse.
///
/// Quantity fields are private; every mutation goes through a method that
/// keeps `available + reserved == total`, recomputes the status and bumps
/// the version used for optimistic checks in storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    id: ItemId,
    product_id: ProductId,
    variant_id: Option<VariantId>,
    warehouse_id: WarehouseId,
    quantity_available: u32,
    quantity_reserved: u32,
    quantity_total: u32,
    min_stock_level: u32,
    max_stock_level: u32,
    reorder_point: u32,
    status: StockStatus,
    cost_price: Money,
    last_cost_price: Money,
    sku: String,
    barcode: Option<String>,
    location: Option<String>,
    last_restocked_at: Option<DateTime<Utc>>,
    last_sold_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
}

impl InventoryItem {
    /// Creates an item from validated input. Initial stock is fully available.
    pub fn create(new: NewInventoryItem, now: DateTime<Utc>) -> Result<Self> {
        new.validate()?;

        let total = new.initial_quantity;
        Ok(Self {
            id: ItemId::new(),
            product_id: new.product_id,
            variant_id: new.variant_id,
            warehouse_id: new.warehouse_id,
            quantity_available: total,
            quantity_reserved: 0,
            quantity_total: total,
            min_stock_level: new.min_stock_level,
            max_stock_level: new.max_stock_level,
            reorder_point: new.reorder_point,
            status: derive_status(total, new.reorder_point),
            cost_price: new.cost_price,
            last_cost_price: new.cost_price,
            sku: new.sku,
            barcode: new.barcode,
            location: new.location,
            last_restocked_at: (total > 0).then_some(now),
            last_sold_at: None,
            created_at: now,
            updated_at: now,
            version: 1,
        })
    }

    /// Creates an empty item at another warehouse copying thresholds, SKU and cost.
    pub fn empty_copy_at(&self, warehouse_id: WarehouseId, now: DateTime<Utc>) -> Self {
        Self {
            id: ItemId::new(),
            warehouse_id,
            quantity_available: 0,
            quantity_reserved: 0,
            quantity_total: 0,
            status: derive_status(0, self.reorder_point),
            barcode: None,
            location: None,
            last_restocked_at: None,
            last_sold_at: None,
            created_at: now,
            updated_at: now,
            version: 1,
            ..self.clone()
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn variant_id(&self) -> Option<VariantId> {
        self.variant_id
    }

    pub fn warehouse_id(&self) -> WarehouseId {
        self.warehouse_id
    }

    pub fn key(&self) -> ItemKey {
        ItemKey::new(self.product_id, self.variant_id, self.warehouse_id)
    }

    pub fn quantity_available(&self) -> u32 {
        self.quantity_available
    }

    pub fn quantity_reserved(&self) -> u32 {
        self.quantity_reserved
    }

    pub fn quantity_total(&self) -> u32 {
        self.quantity_total
    }

    pub fn min_stock_level(&self) -> u32 {
        self.min_stock_level
    }

    pub fn max_stock_level(&self) -> u32 {
        self.max_stock_level
    }

    pub fn reorder_point(&self) -> u32 {
        self.reorder_point
    }

    pub fn status(&self) -> StockStatus {
        self.status
    }

    pub fn cost_price(&self) -> Money {
        self.cost_price
    }

    pub fn last_cost_price(&self) -> Money {
        self.last_cost_price
    }

    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn barcode(&self) -> Option<&str> {
        self.barcode.as_deref()
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn last_restocked_at(&self) -> Option<DateTime<Utc>> {
        self.last_restocked_at
    }

    pub fn last_sold_at(&self) -> Option<DateTime<Utc>> {
        self.last_sold_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns true if `quantity` can be reserved right now.
    pub fn can_reserve(&self, quantity: u32) -> bool {
        quantity > 0 && quantity <= self.quantity_available
    }

    /// Checks the quantity invariant.
    pub fn is_consistent(&self) -> bool {
        self.quantity_available as u64 + self.quantity_reserved as u64 == self.quantity_total as u64
    }

    /// Moves `quantity` from available to reserved.
    pub fn reserve(&mut self, quantity: u32, now: DateTime<Utc>) -> Result<()> {
        Self::require_positive(quantity)?;
        if quantity > self.quantity_available {
            return Err(InventoryError::InsufficientStock {
                requested: quantity as u64,
                available: self.quantity_available as u64,
            });
        }

        self.quantity_available -= quantity;
        self.quantity_reserved += quantity;
        self.touch(now);
        Ok(())
    }

    /// Moves `quantity` back from reserved to available.
    pub fn release(&mut self, quantity: u32, now: DateTime<Utc>) -> Result<()> {
        self.require_reserved(quantity)?;

        self.quantity_reserved -= quantity;
        self.quantity_available += quantity;
        self.touch(now);
        Ok(())
    }

    /// Consumes reserved stock: it leaves the warehouse.
    pub fn fulfill(&mut self, quantity: u32, now: DateTime<Utc>) -> Result<()> {
        self.require_reserved(quantity)?;

        self.quantity_reserved -= quantity;
        self.quantity_total -= quantity;
        self.last_sold_at = Some(now);
        self.touch(now);
        Ok(())
    }

    /// Receives stock. A positive cost becomes the new cost price.
    pub fn add_stock(
        &mut self,
        quantity: u32,
        cost_price: Option<Money>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        Self::require_positive(quantity)?;
        let (available, total) = self
            .quantity_available
            .checked_add(quantity)
            .zip(self.quantity_total.checked_add(quantity))
            .ok_or_else(|| InventoryError::invalid_quantity("quantity overflows stock counters"))?;

        self.quantity_available = available;
        self.quantity_total = total;
        if let Some(cost) = cost_price
            && cost.is_positive()
        {
            self.last_cost_price = self.cost_price;
            self.cost_price = cost;
        }
        self.last_restocked_at = Some(now);
        self.touch(now);
        Ok(())
    }

    /// Removes unreserved stock (damage, shrinkage, manual outbound).
    pub fn remove_stock(&mut self, quantity: u32, now: DateTime<Utc>) -> Result<()> {
        Self::require_positive(quantity)?;
        if quantity > self.quantity_available {
            return Err(InventoryError::InsufficientStock {
                requested: quantity as u64,
                available: self.quantity_available as u64,
            });
        }

        self.quantity_available -= quantity;
        self.quantity_total -= quantity;
        self.touch(now);
        Ok(())
    }

    /// Flags an empty item as backordered.
    pub fn mark_backorder(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.quantity_total != 0 {
            return Err(InventoryError::validation(format!(
                "only an empty item can be backordered (total is {})",
                self.quantity_total
            )));
        }
        self.updated_at = now;
        self.version += 1;
        self.status = StockStatus::Backorder;
        Ok(())
    }

    /// Applies threshold and descriptive changes.
    pub fn apply_update(&mut self, update: ItemUpdate, now: DateTime<Utc>) -> Result<()> {
        update.validate()?;

        if let Some(min) = update.min_stock_level {
            self.min_stock_level = min;
        }
        if let Some(max) = update.max_stock_level {
            self.max_stock_level = max;
        }
        if let Some(reorder) = update.reorder_point {
            self.reorder_point = reorder;
        }
        if let Some(location) = update.location {
            self.location = Some(location);
        }
        if let Some(barcode) = update.barcode {
            self.barcode = Some(barcode);
        }
        if let Some(cost) = update.cost_price
            && cost != self.cost_price
        {
            self.last_cost_price = self.cost_price;
            self.cost_price = cost;
        }
        self.touch(now);
        Ok(())
    }

    fn require_positive(quantity: u32) -> Result<()> {
        if quantity == 0 {
            return Err(InventoryError::invalid_quantity("quantity must be greater than 0"));
        }
        Ok(())
    }

    fn require_reserved(&self, quantity: u32) -> Result<()> {
        Self::require_positive(quantity)?;
        if quantity > self.quantity_reserved {
            return Err(InventoryError::invalid_quantity(format!(
                "quantity {quantity} exceeds reserved {}",
                self.quantity_reserved
            )));
        }
        Ok(())
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.status = derive_status(self.quantity_total, self.reorder_point);
        self.updated_at = now;
        self.version += 1;
        debug_assert!(self.is_consistent());
    }
}
