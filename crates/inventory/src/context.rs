//! Shared handles used by every service.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::{Clock, ItemId, MovementId};
use domain::{
    AlertRepository, InventoryError, InventoryItem, InventoryItemRepository,
    ReservationRepository, Result, WarehouseRepository,
};
use ledger::{MovementStore, StockMovement};

use crate::locks::ItemLocks;
use crate::services::{OrderSystem, ProductCatalog};

/// Storage ports, collaborators, clock and the lock registry.
#[derive(Clone)]
pub struct InventoryContext {
    pub items: Arc<dyn InventoryItemRepository>,
    pub warehouses: Arc<dyn WarehouseRepository>,
    pub reservations: Arc<dyn ReservationRepository>,
    pub alerts: Arc<dyn AlertRepository>,
    pub ledger: Arc<dyn MovementStore>,
    pub catalog: Arc<dyn ProductCatalog>,
    pub orders: Arc<dyn OrderSystem>,
    pub clock: Arc<dyn Clock>,
    pub locks: Arc<ItemLocks>,
}

/// An item loaded for mutation, with the copy it was loaded as.
///
/// Callers must hold the item's lock for as long as this value is alive.
#[derive(Debug, Clone)]
pub(crate) struct LoadedItem {
    pub item: InventoryItem,
    pub original: InventoryItem,
}

impl LoadedItem {
    /// Total before any change made through this handle.
    pub fn original_total(&self) -> i64 {
        self.original.quantity_total() as i64
    }

    pub fn total(&self) -> i64 {
        self.item.quantity_total() as i64
    }
}

impl InventoryContext {
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub async fn find_item(&self, item_id: ItemId) -> Result<InventoryItem> {
        self.items
            .get(item_id)
            .await?
            .ok_or_else(|| InventoryError::item_not_found(item_id))
    }

    /// Loads an item for mutation. The caller holds the item's lock.
    pub(crate) async fn load_for_update(&self, item_id: ItemId) -> Result<LoadedItem> {
        let item = self.find_item(item_id).await?;
        Ok(LoadedItem {
            original: item.clone(),
            item,
        })
    }

    /// Persists a mutated item against the version it was loaded at.
    pub(crate) async fn save(&self, loaded: &LoadedItem) -> Result<()> {
        self.items
            .update(&loaded.item, loaded.original.version())
            .await
    }

    /// Puts a saved item back the way it was loaded.
    pub(crate) async fn restore(&self, loaded: &LoadedItem) {
        if let Err(e) = self
            .items
            .update(&loaded.original, loaded.item.version())
            .await
        {
            tracing::error!(
                item_id = %loaded.original.id(),
                error = %e,
                "failed to restore item after error"
            );
        }
    }

    pub async fn record(&self, movement: StockMovement) -> Result<MovementId> {
        Ok(self.ledger.record(movement).await?)
    }

    /// Saves the item, then records its movement. A rejected ledger write
    /// puts the item back so quantities and ledger never diverge.
    pub(crate) async fn commit(
        &self,
        loaded: &LoadedItem,
        movement: StockMovement,
    ) -> Result<StockMovement> {
        self.save(loaded).await?;
        if let Err(e) = self.record(movement.clone()).await {
            self.restore(loaded).await;
            return Err(e);
        }
        Ok(movement)
    }
}
