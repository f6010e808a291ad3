//! Warehouse Registry: fulfillment locations and their priority order.

use std::sync::Arc;

use common::WarehouseId;
use domain::{
    CapacityUtilization, InventoryError, NewWarehouse, Result, Warehouse, WarehouseStockTotals,
    WarehouseUpdate,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::context::InventoryContext;

/// Capacity usage plus the stock totals it was computed from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapacityReport {
    pub warehouse_id: WarehouseId,
    pub code: String,
    pub utilization: CapacityUtilization,
    pub totals: WarehouseStockTotals,
}

#[derive(Clone)]
pub struct WarehouseRegistry {
    ctx: InventoryContext,
    /// Serializes writes that can move the default flag.
    writes: Arc<Mutex<()>>,
}

impl WarehouseRegistry {
    pub fn new(ctx: InventoryContext) -> Self {
        Self {
            ctx,
            writes: Arc::new(Mutex::new(())),
        }
    }

    #[tracing::instrument(skip(self, new), fields(code = %new.code))]
    pub async fn create(&self, new: NewWarehouse) -> Result<Warehouse> {
        let warehouse = Warehouse::create(new, self.ctx.now())?;

        let _writes = self.writes.lock().await;
        if self
            .ctx
            .warehouses
            .get_by_code(&warehouse.code)
            .await?
            .is_some()
        {
            return Err(InventoryError::DuplicateWarehouse(warehouse.code));
        }

        self.ctx.warehouses.insert(warehouse.clone()).await?;
        if warehouse.is_default {
            self.clear_other_defaults(warehouse.id).await?;
        }

        tracing::info!(warehouse_id = %warehouse.id, "warehouse created");
        Ok(warehouse)
    }

    pub async fn get(&self, id: WarehouseId) -> Result<Warehouse> {
        self.ctx
            .warehouses
            .get(id)
            .await?
            .ok_or_else(|| InventoryError::warehouse_not_found(id))
    }

    pub async fn get_by_code(&self, code: &str) -> Result<Warehouse> {
        self.ctx
            .warehouses
            .get_by_code(code)
            .await?
            .ok_or_else(|| InventoryError::WarehouseNotFound(code.to_string()))
    }

    /// Warehouses ordered by priority, then code.
    pub async fn list(&self, active_only: bool) -> Result<Vec<Warehouse>> {
        self.ctx.warehouses.list(active_only).await
    }

    /// The warehouse flagged as default, if any.
    pub async fn default_warehouse(&self) -> Result<Option<Warehouse>> {
        Ok(self
            .ctx
            .warehouses
            .list(false)
            .await?
            .into_iter()
            .find(|w| w.is_default))
    }

    #[tracing::instrument(skip(self, update))]
    pub async fn update(&self, id: WarehouseId, update: WarehouseUpdate) -> Result<Warehouse> {
        let _writes = self.writes.lock().await;
        let mut warehouse = self.get(id).await?;
        warehouse.apply_update(update, self.ctx.now())?;
        self.ctx.warehouses.update(&warehouse).await?;
        if warehouse.is_default {
            self.clear_other_defaults(warehouse.id).await?;
        }
        Ok(warehouse)
    }

    /// Deletes a warehouse holding no inventory items.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: WarehouseId) -> Result<()> {
        let _writes = self.writes.lock().await;
        let totals = self.ctx.items.warehouse_totals(id).await?;
        if totals.items > 0 {
            return Err(InventoryError::validation(format!(
                "warehouse {id} still holds {} inventory items",
                totals.items
            )));
        }
        if !self.ctx.warehouses.delete(id).await? {
            return Err(InventoryError::warehouse_not_found(id));
        }
        tracing::info!(warehouse_id = %id, "warehouse deleted");
        Ok(())
    }

    pub async fn capacity(&self, id: WarehouseId) -> Result<CapacityReport> {
        let warehouse = self.get(id).await?;
        let totals = self.ctx.items.warehouse_totals(id).await?;
        Ok(CapacityReport {
            warehouse_id: warehouse.id,
            utilization: warehouse.utilization(totals.quantity_total),
            code: warehouse.code,
            totals,
        })
    }

    async fn clear_other_defaults(&self, keep: WarehouseId) -> Result<()> {
        let now = self.ctx.now();
        for mut other in self.ctx.warehouses.list(false).await? {
            if other.id != keep && other.is_default {
                other.is_default = false;
                other.updated_at = now;
                self.ctx.warehouses.update(&other).await?;
            }
        }
        Ok(())
    }
}
