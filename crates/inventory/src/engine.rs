//! The engine facade and its builder.

use std::sync::Arc;
use std::time::Duration;

use common::{Clock, ItemId, ReservationId, SystemClock};
use domain::{
    AlertRepository, InMemoryAlertRepository, InMemoryItemRepository,
    InMemoryReservationRepository, InMemoryWarehouseRepository, InventoryError, InventoryItem,
    InventoryItemRepository, NewInventoryItem, ReservationRepository, ReservationTtl, Result,
    StockReservation, WarehouseRepository,
};
use ledger::{InMemoryMovementStore, MovementStore, StockMovement};

use crate::alerts::{AlertDedupPolicy, AlertGenerator, AlertScanReport};
use crate::allocation::{AllocationPlanner, Availability};
use crate::context::InventoryContext;
use crate::items::{ItemService, TransferResult};
use crate::locks::ItemLocks;
use crate::reports::ReportService;
use crate::requests::{AdjustStockRequest, AvailabilityRequest, ReserveRequest, TransferRequest};
use crate::reservations::{ReservationManager, SweepReport};
use crate::scheduler::{MaintenanceScheduler, ScheduleSettings};
use crate::services::{OrderSystem, ProductCatalog};
use crate::warehouses::WarehouseRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Hold time applied when a reservation request names none.
    pub default_ttl: ReservationTtl,
    pub alert_dedup: AlertDedupPolicy,
    pub alert_batch_size: usize,
    pub sweep_batch_size: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            default_ttl: ReservationTtl::default(),
            alert_dedup: AlertDedupPolicy::default(),
            alert_batch_size: 100,
            sweep_batch_size: 100,
        }
    }
}

/// Entry point to every inventory operation.
///
/// Cheap to clone; all clones share storage, collaborators and item locks.
#[derive(Clone)]
pub struct InventoryEngine {
    ctx: InventoryContext,
    settings: EngineSettings,
    items: ItemService,
    warehouses: WarehouseRegistry,
    planner: AllocationPlanner,
    reservations: ReservationManager,
    alerts: AlertGenerator,
    reports: ReportService,
}

impl InventoryEngine {
    pub fn builder() -> InventoryEngineBuilder {
        InventoryEngineBuilder::default()
    }

    fn from_context(ctx: InventoryContext, settings: EngineSettings) -> Self {
        let planner = AllocationPlanner::new(ctx.clone());
        Self {
            items: ItemService::new(ctx.clone()),
            warehouses: WarehouseRegistry::new(ctx.clone()),
            reservations: ReservationManager::new(ctx.clone(), planner.clone(), settings.default_ttl),
            alerts: AlertGenerator::new(ctx.clone(), settings.alert_dedup, settings.alert_batch_size),
            reports: ReportService::new(ctx.clone()),
            planner,
            settings,
            ctx,
        }
    }

    pub fn settings(&self) -> EngineSettings {
        self.settings
    }

    pub fn items(&self) -> &ItemService {
        &self.items
    }

    pub fn warehouses(&self) -> &WarehouseRegistry {
        &self.warehouses
    }

    pub fn planner(&self) -> &AllocationPlanner {
        &self.planner
    }

    pub fn reservations(&self) -> &ReservationManager {
        &self.reservations
    }

    pub fn alerts(&self) -> &AlertGenerator {
        &self.alerts
    }

    pub fn reports(&self) -> &ReportService {
        &self.reports
    }

    pub fn ledger(&self) -> &Arc<dyn MovementStore> {
        &self.ctx.ledger
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.ctx.clock
    }

    pub async fn create_item(&self, new: NewInventoryItem, actor: &str) -> Result<InventoryItem> {
        self.items.create(new, actor).await
    }

    pub async fn check_availability(&self, request: AvailabilityRequest) -> Result<Availability> {
        request.validate()?;
        self.planner
            .suggest(
                request.product_id,
                request.variant_id,
                request.quantity,
                request.warehouse_id,
            )
            .await
    }

    pub async fn reserve(&self, request: ReserveRequest) -> Result<Vec<StockReservation>> {
        self.reservations.reserve(request).await
    }

    pub async fn release(&self, reservation_id: ReservationId, actor: &str) -> Result<bool> {
        self.reservations.release(reservation_id, actor).await
    }

    pub async fn fulfill(&self, reservation_id: ReservationId, actor: &str) -> Result<StockReservation> {
        self.reservations.fulfill(reservation_id, actor).await
    }

    pub async fn adjust_stock(&self, item_id: ItemId, request: AdjustStockRequest) -> Result<StockMovement> {
        self.items.adjust(item_id, request).await
    }

    pub async fn transfer(&self, request: TransferRequest) -> Result<TransferResult> {
        self.items.transfer(request).await
    }

    pub async fn generate_alerts(&self) -> Result<AlertScanReport> {
        self.alerts.generate().await
    }

    /// One expiry sweep with the configured batch size.
    pub async fn sweep_expired(&self) -> Result<SweepReport> {
        self.reservations
            .sweep_expired(self.settings.sweep_batch_size)
            .await
    }

    /// Scheduler running the expiry sweep and alert scan at the given periods.
    pub fn scheduler(&self, sweep_interval: Duration, alert_interval: Duration) -> MaintenanceScheduler {
        MaintenanceScheduler::new(
            self.reservations.clone(),
            self.alerts.clone(),
            ScheduleSettings {
                sweep_interval,
                sweep_batch_size: self.settings.sweep_batch_size,
                alert_interval,
            },
        )
    }
}

/// Collects the engine's components. Every storage port and collaborator is
/// required; [`InventoryEngineBuilder::build`] fails on the first one missing.
#[derive(Default)]
pub struct InventoryEngineBuilder {
    items: Option<Arc<dyn InventoryItemRepository>>,
    warehouses: Option<Arc<dyn WarehouseRepository>>,
    reservations: Option<Arc<dyn ReservationRepository>>,
    alerts: Option<Arc<dyn AlertRepository>>,
    ledger: Option<Arc<dyn MovementStore>>,
    catalog: Option<Arc<dyn ProductCatalog>>,
    orders: Option<Arc<dyn OrderSystem>>,
    clock: Option<Arc<dyn Clock>>,
    settings: EngineSettings,
}

impl InventoryEngineBuilder {
    pub fn items(mut self, items: Arc<dyn InventoryItemRepository>) -> Self {
        self.items = Some(items);
        self
    }

    pub fn warehouses(mut self, warehouses: Arc<dyn WarehouseRepository>) -> Self {
        self.warehouses = Some(warehouses);
        self
    }

    pub fn reservations(mut self, reservations: Arc<dyn ReservationRepository>) -> Self {
        self.reservations = Some(reservations);
        self
    }

    pub fn alerts(mut self, alerts: Arc<dyn AlertRepository>) -> Self {
        self.alerts = Some(alerts);
        self
    }

    pub fn ledger(mut self, ledger: Arc<dyn MovementStore>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Uses in-memory repositories for every entity and, unless one was
    /// already given, an in-memory ledger.
    pub fn in_memory_storage(mut self) -> Self {
        self.items = Some(Arc::new(InMemoryItemRepository::new()));
        self.warehouses = Some(Arc::new(InMemoryWarehouseRepository::new()));
        self.reservations = Some(Arc::new(InMemoryReservationRepository::new()));
        self.alerts = Some(Arc::new(InMemoryAlertRepository::new()));
        if self.ledger.is_none() {
            self.ledger = Some(Arc::new(InMemoryMovementStore::new()));
        }
        self
    }

    pub fn catalog(mut self, catalog: Arc<dyn ProductCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn orders(mut self, orders: Arc<dyn OrderSystem>) -> Self {
        self.orders = Some(orders);
        self
    }

    /// Defaults to the system clock.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn build(self) -> Result<InventoryEngine> {
        let ctx = InventoryContext {
            items: self.items.ok_or(InventoryError::MissingComponent("item repository"))?,
            warehouses: self
                .warehouses
                .ok_or(InventoryError::MissingComponent("warehouse repository"))?,
            reservations: self
                .reservations
                .ok_or(InventoryError::MissingComponent("reservation repository"))?,
            alerts: self.alerts.ok_or(InventoryError::MissingComponent("alert repository"))?,
            ledger: self.ledger.ok_or(InventoryError::MissingComponent("movement ledger"))?,
            catalog: self.catalog.ok_or(InventoryError::MissingComponent("product catalog"))?,
            orders: self.orders.ok_or(InventoryError::MissingComponent("order system"))?,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            locks: Arc::new(ItemLocks::new()),
        };
        Ok(InventoryEngine::from_context(ctx, self.settings))
    }
}
