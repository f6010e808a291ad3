use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{AlertId, ItemId, OrderId, ProductId, ReservationId, VariantId, WarehouseId};
use tokio::sync::RwLock;

use super::{
    AlertRepository, InventoryItemRepository, ItemFilter, ReservationRepository,
    WarehouseRepository, WarehouseStockTotals,
};
use crate::{
    AlertQuery, AlertType, InventoryError, InventoryItem, ItemKey, Page, PageRequest, Result,
    StockAlert, StockReservation, Warehouse,
};

/// In-memory inventory item repository.
#[derive(Clone, Default)]
pub struct InMemoryItemRepository {
    items: Arc<RwLock<HashMap<ItemId, InventoryItem>>>,
}

impl InMemoryItemRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    fn sorted<'a>(items: impl Iterator<Item = &'a InventoryItem>) -> Vec<InventoryItem> {
        let mut items: Vec<_> = items.cloned().collect();
        items.sort_by(|a, b| a.created_at().cmp(&b.created_at()).then(a.id().cmp(&b.id())));
        items
    }
}

#[async_trait]
impl InventoryItemRepository for InMemoryItemRepository {
    async fn insert(&self, item: InventoryItem) -> Result<()> {
        let mut items = self.items.write().await;
        let key = item.key();
        if items.values().any(|existing| existing.key() == key) {
            return Err(InventoryError::duplicate_item(
                key.product_id,
                key.variant_id,
                key.warehouse_id,
            ));
        }
        items.insert(item.id(), item);
        Ok(())
    }

    async fn get(&self, id: ItemId) -> Result<Option<InventoryItem>> {
        Ok(self.items.read().await.get(&id).cloned())
    }

    async fn get_by_key(&self, key: &ItemKey) -> Result<Option<InventoryItem>> {
        let items = self.items.read().await;
        Ok(items.values().find(|item| item.key() == *key).cloned())
    }

    async fn find_by_sku(&self, sku: &str) -> Result<Vec<InventoryItem>> {
        let items = self.items.read().await;
        Ok(Self::sorted(items.values().filter(|item| item.sku() == sku)))
    }

    async fn find_by_barcode(&self, barcode: &str) -> Result<Vec<InventoryItem>> {
        let items = self.items.read().await;
        Ok(Self::sorted(
            items.values().filter(|item| item.barcode() == Some(barcode)),
        ))
    }

    async fn find_for_product(
        &self,
        product_id: ProductId,
        variant_id: Option<VariantId>,
    ) -> Result<Vec<InventoryItem>> {
        let items = self.items.read().await;
        Ok(Self::sorted(items.values().filter(|item| {
            item.product_id() == product_id && item.variant_id() == variant_id
        })))
    }

    async fn list(&self, filter: &ItemFilter, page: PageRequest) -> Result<Page<InventoryItem>> {
        let items = self.items.read().await;
        Ok(page.apply(Self::sorted(items.values().filter(|item| filter.matches(item)))))
    }

    async fn update(&self, item: &InventoryItem, expected_version: u64) -> Result<()> {
        let mut items = self.items.write().await;
        let stored = items
            .get_mut(&item.id())
            .ok_or_else(|| InventoryError::item_not_found(item.id()))?;

        if stored.version() != expected_version {
            return Err(InventoryError::ConcurrencyConflict {
                item_id: item.id(),
                expected: expected_version,
                actual: stored.version(),
            });
        }
        *stored = item.clone();
        Ok(())
    }

    async fn delete(&self, id: ItemId) -> Result<bool> {
        Ok(self.items.write().await.remove(&id).is_some())
    }

    async fn warehouse_totals(&self, warehouse_id: WarehouseId) -> Result<WarehouseStockTotals> {
        let items = self.items.read().await;
        Ok(items
            .values()
            .filter(|item| item.warehouse_id() == warehouse_id)
            .fold(WarehouseStockTotals::default(), |mut totals, item| {
                totals.items += 1;
                totals.quantity_available += item.quantity_available() as u64;
                totals.quantity_reserved += item.quantity_reserved() as u64;
                totals.quantity_total += item.quantity_total() as u64;
                totals
            }))
    }
}

/// In-memory warehouse repository.
#[derive(Clone, Default)]
pub struct InMemoryWarehouseRepository {
    warehouses: Arc<RwLock<HashMap<WarehouseId, Warehouse>>>,
}

impl InMemoryWarehouseRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WarehouseRepository for InMemoryWarehouseRepository {
    async fn insert(&self, warehouse: Warehouse) -> Result<()> {
        let mut warehouses = self.warehouses.write().await;
        if warehouses.values().any(|w| w.code == warehouse.code) {
            return Err(InventoryError::DuplicateWarehouse(warehouse.code));
        }
        warehouses.insert(warehouse.id, warehouse);
        Ok(())
    }

    async fn get(&self, id: WarehouseId) -> Result<Option<Warehouse>> {
        Ok(self.warehouses.read().await.get(&id).cloned())
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<Warehouse>> {
        let warehouses = self.warehouses.read().await;
        Ok(warehouses.values().find(|w| w.code == code).cloned())
    }

    async fn list(&self, active_only: bool) -> Result<Vec<Warehouse>> {
        let warehouses = self.warehouses.read().await;
        let mut list: Vec<_> = warehouses
            .values()
            .filter(|w| !active_only || w.is_active)
            .cloned()
            .collect();
        list.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.code.cmp(&b.code)));
        Ok(list)
    }

    async fn update(&self, warehouse: &Warehouse) -> Result<()> {
        let mut warehouses = self.warehouses.write().await;
        let stored = warehouses
            .get_mut(&warehouse.id)
            .ok_or_else(|| InventoryError::warehouse_not_found(warehouse.id))?;
        *stored = warehouse.clone();
        Ok(())
    }

    async fn delete(&self, id: WarehouseId) -> Result<bool> {
        Ok(self.warehouses.write().await.remove(&id).is_some())
    }
}

/// In-memory reservation repository.
#[derive(Clone, Default)]
pub struct InMemoryReservationRepository {
    reservations: Arc<RwLock<HashMap<ReservationId, StockReservation>>>,
}

impl InMemoryReservationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted<'a>(reservations: impl Iterator<Item = &'a StockReservation>) -> Vec<StockReservation> {
        let mut list: Vec<_> = reservations.cloned().collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        list
    }
}

#[async_trait]
impl ReservationRepository for InMemoryReservationRepository {
    async fn insert(&self, reservation: StockReservation) -> Result<()> {
        let mut reservations = self.reservations.write().await;
        if reservations.contains_key(&reservation.id)
            || reservations.values().any(|r| r.code == reservation.code)
        {
            return Err(InventoryError::DuplicateReservation(reservation.code));
        }
        reservations.insert(reservation.id, reservation);
        Ok(())
    }

    async fn get(&self, id: ReservationId) -> Result<Option<StockReservation>> {
        Ok(self.reservations.read().await.get(&id).cloned())
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<StockReservation>> {
        let reservations = self.reservations.read().await;
        Ok(reservations.values().find(|r| r.code == code).cloned())
    }

    async fn find_by_order(&self, order_id: OrderId) -> Result<Vec<StockReservation>> {
        let reservations = self.reservations.read().await;
        Ok(Self::sorted(
            reservations.values().filter(|r| r.order_id == order_id),
        ))
    }

    async fn find_by_item(&self, item_id: ItemId, active_only: bool) -> Result<Vec<StockReservation>> {
        let reservations = self.reservations.read().await;
        Ok(Self::sorted(reservations.values().filter(|r| {
            r.inventory_item_id == item_id && (!active_only || r.is_active())
        })))
    }

    async fn find_expired(&self, now: DateTime<Utc>, limit: usize) -> Result<Vec<StockReservation>> {
        let reservations = self.reservations.read().await;
        let mut expired: Vec<_> = reservations
            .values()
            .filter(|r| r.is_expired(now))
            .cloned()
            .collect();
        expired.sort_by(|a, b| a.expires_at.cmp(&b.expires_at).then(a.id.cmp(&b.id)));
        expired.truncate(limit);
        Ok(expired)
    }

    async fn update(&self, reservation: &StockReservation) -> Result<()> {
        let mut reservations = self.reservations.write().await;
        let stored = reservations
            .get_mut(&reservation.id)
            .ok_or_else(|| InventoryError::reservation_not_found(reservation.id))?;
        *stored = reservation.clone();
        Ok(())
    }
}

/// In-memory alert repository.
#[derive(Clone, Default)]
pub struct InMemoryAlertRepository {
    alerts: Arc<RwLock<HashMap<AlertId, StockAlert>>>,
}

impl InMemoryAlertRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.alerts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.alerts.read().await.is_empty()
    }
}

#[async_trait]
impl AlertRepository for InMemoryAlertRepository {
    async fn insert(&self, alert: StockAlert) -> Result<()> {
        self.alerts.write().await.insert(alert.id, alert);
        Ok(())
    }

    async fn get(&self, id: AlertId) -> Result<Option<StockAlert>> {
        Ok(self.alerts.read().await.get(&id).cloned())
    }

    async fn find(&self, query: &AlertQuery) -> Result<Page<StockAlert>> {
        let alerts = self.alerts.read().await;
        let mut matching: Vec<_> = alerts.values().filter(|a| query.matches(a)).cloned().collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(query.page.apply(matching))
    }

    async fn has_unresolved(&self, item_id: ItemId, alert_type: AlertType) -> Result<bool> {
        let alerts = self.alerts.read().await;
        Ok(alerts.values().any(|a| {
            a.inventory_item_id == item_id && a.alert_type == alert_type && !a.is_resolved
        }))
    }

    async fn update(&self, alert: &StockAlert) -> Result<()> {
        let mut alerts = self.alerts.write().await;
        let stored = alerts
            .get_mut(&alert.id)
            .ok_or_else(|| InventoryError::AlertNotFound(alert.id.to_string()))?;
        *stored = alert.clone();
        Ok(())
    }

    async fn delete_resolved_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut alerts = self.alerts.write().await;
        let before = alerts.len();
        alerts.retain(|_, a| !(a.is_resolved && a.created_at < cutoff));
        Ok((before - alerts.len()) as u64)
    }
}
