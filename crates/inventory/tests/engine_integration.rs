//! Integration tests for the inventory engine.
//!
//! These drive the public operations end to end over in-memory storage and
//! check quantities, reservation state and the movement ledger together.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use common::{ManualClock, Money, MovementId, OrderId, ProductId, WarehouseId};
use domain::{
    AlertQuery, AlertType, InventoryError, InventoryItem, ItemUpdate, NewInventoryItem,
    NewWarehouse, ReservationState, StockStatus, Warehouse, WarehouseUpdate,
};
use inventory::{
    AdjustStockRequest, AlertDedupPolicy, AvailabilityRequest, BulkReserveLine,
    BulkReserveRequest, EngineSettings, InMemoryOrderSystem, InMemoryProductCatalog,
    InventoryEngine, ReserveRequest, TransferRequest,
};
use ledger::{
    InMemoryMovementStore, LedgerError, MovementQuery, MovementStore, MovementStoreExt,
    MovementStream, MovementType, StockMovement,
};

/// Ledger that can be told to reject writes.
#[derive(Clone, Default)]
struct FlakyLedger {
    inner: InMemoryMovementStore,
    fail_writes: Arc<AtomicBool>,
}

impl FlakyLedger {
    fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl MovementStore for FlakyLedger {
    async fn record(&self, movement: StockMovement) -> ledger::Result<MovementId> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(LedgerError::InvalidMovement("ledger unavailable".to_string()));
        }
        self.inner.record(movement).await
    }

    async fn get(&self, id: MovementId) -> ledger::Result<Option<StockMovement>> {
        self.inner.get(id).await
    }

    async fn movements_for_item(&self, item_id: common::ItemId) -> ledger::Result<Vec<StockMovement>> {
        self.inner.movements_for_item(item_id).await
    }

    async fn query(&self, query: MovementQuery) -> ledger::Result<Vec<StockMovement>> {
        self.inner.query(query).await
    }

    async fn count(&self, query: MovementQuery) -> ledger::Result<u64> {
        self.inner.count(query).await
    }

    async fn stream_all(&self) -> ledger::Result<MovementStream> {
        self.inner.stream_all().await
    }

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> ledger::Result<u64> {
        self.inner.purge_before(cutoff).await
    }
}

struct Fixture {
    engine: InventoryEngine,
    clock: ManualClock,
    ledger: FlakyLedger,
    orders: InMemoryOrderSystem,
}

fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
}

fn fixture_with(settings: EngineSettings, catalog: InMemoryProductCatalog) -> Fixture {
    let clock = ManualClock::new(start_time());
    let ledger = FlakyLedger::default();
    let orders = InMemoryOrderSystem::new();
    let engine = InventoryEngine::builder()
        .ledger(Arc::new(ledger.clone()))
        .in_memory_storage()
        .catalog(Arc::new(catalog))
        .orders(Arc::new(orders.clone()))
        .clock(Arc::new(clock.clone()))
        .settings(settings)
        .build()
        .unwrap();
    Fixture {
        engine,
        clock,
        ledger,
        orders,
    }
}

fn fixture() -> Fixture {
    fixture_with(EngineSettings::default(), InMemoryProductCatalog::accept_all())
}

fn new_item(product_id: ProductId, warehouse_id: WarehouseId, quantity: u32, reorder: u32) -> NewInventoryItem {
    NewInventoryItem {
        product_id,
        variant_id: None,
        warehouse_id,
        initial_quantity: quantity,
        min_stock_level: 0,
        max_stock_level: 1000,
        reorder_point: reorder,
        sku: format!("SKU-{}", &product_id.to_string()[..8]),
        barcode: None,
        location: None,
        cost_price: Money::from_cents(250),
    }
}

impl Fixture {
    async fn warehouse(&self, code: &str, priority: i32) -> Warehouse {
        self.engine
            .warehouses()
            .create(NewWarehouse::new(code, format!("Warehouse {code}"), priority))
            .await
            .unwrap()
    }

    async fn item(&self, product_id: ProductId, warehouse: &Warehouse, quantity: u32, reorder: u32) -> InventoryItem {
        self.engine
            .create_item(new_item(product_id, warehouse.id, quantity, reorder), "tester")
            .await
            .unwrap()
    }

    async fn reload(&self, item: &InventoryItem) -> InventoryItem {
        self.engine.items().get(item.id()).await.unwrap()
    }

    async fn assert_ledger_matches(&self, item: &InventoryItem) {
        let current = self.reload(item).await;
        let replay = self.engine.ledger().replay(item.id()).await.unwrap();
        assert!(replay.is_continuous(), "ledger breaks: {:?}", replay.breaks);
        assert_eq!(replay.total, current.quantity_total() as i64);
        assert!(current.is_consistent());
    }
}

mod item_lifecycle {
    use super::*;

    #[tokio::test]
    async fn reserve_and_fulfill_scenario() {
        let f = fixture();
        let w1 = f.warehouse("W1", 1).await;
        let product = ProductId::new();

        let item = f.item(product, &w1, 100, 10).await;
        assert_eq!(item.status(), StockStatus::InStock);

        let reservations = f
            .engine
            .reserve(ReserveRequest::new(product, OrderId::new(), 95))
            .await
            .unwrap();
        assert_eq!(reservations.len(), 1);

        let reserved = f.reload(&item).await;
        assert_eq!(reserved.quantity_available(), 5);
        assert_eq!(reserved.quantity_reserved(), 95);
        assert_eq!(reserved.quantity_total(), 100);
        assert_eq!(reserved.status(), StockStatus::InStock);

        let fulfilled = f.engine.fulfill(reservations[0].id, "shipping").await.unwrap();
        assert_eq!(fulfilled.state, ReservationState::Fulfilled);

        let shipped = f.reload(&item).await;
        assert_eq!(shipped.quantity_available(), 5);
        assert_eq!(shipped.quantity_reserved(), 0);
        assert_eq!(shipped.quantity_total(), 5);
        assert_eq!(shipped.status(), StockStatus::LowStock);
        assert!(shipped.last_sold_at().is_some());

        f.assert_ledger_matches(&item).await;
    }

    #[tokio::test]
    async fn damaged_adjustment_empties_item() {
        let f = fixture();
        let w1 = f.warehouse("W1", 1).await;
        let item = f.item(ProductId::new(), &w1, 5, 2).await;

        let movement = f
            .engine
            .adjust_stock(item.id(), AdjustStockRequest::new(-5, MovementType::Damaged, "water damage"))
            .await
            .unwrap();
        assert_eq!(movement.movement_type, MovementType::Damaged);
        assert_eq!(movement.previous_quantity, 5);
        assert_eq!(movement.new_quantity, 0);

        let current = f.reload(&item).await;
        assert_eq!(current.quantity_total(), 0);
        assert_eq!(current.status(), StockStatus::OutOfStock);

        let damaged = f
            .engine
            .items()
            .movements(item.id(), MovementQuery::new().movement_type(MovementType::Damaged))
            .await
            .unwrap();
        assert_eq!(damaged.len(), 1);
        f.assert_ledger_matches(&item).await;
    }

    #[tokio::test]
    async fn adjustment_cannot_remove_reserved_stock() {
        let f = fixture();
        let w1 = f.warehouse("W1", 1).await;
        let product = ProductId::new();
        let item = f.item(product, &w1, 10, 0).await;
        f.engine
            .reserve(ReserveRequest::new(product, OrderId::new(), 8))
            .await
            .unwrap();

        let err = f
            .engine
            .adjust_stock(item.id(), AdjustStockRequest::new(-3, MovementType::Outbound, "count"))
            .await
            .unwrap_err();
        assert!(matches!(err, InventoryError::InsufficientStock { requested: 3, available: 2 }));
        assert_eq!(f.reload(&item).await.quantity_total(), 10);
    }

    #[tokio::test]
    async fn inbound_adjustment_updates_cost() {
        let f = fixture();
        let w1 = f.warehouse("W1", 1).await;
        let item = f.item(ProductId::new(), &w1, 1, 0).await;

        let mut request = AdjustStockRequest::new(20, MovementType::Inbound, "purchase order");
        request.unit_cost = Money::from_cents(300);
        let movement = f.engine.adjust_stock(item.id(), request).await.unwrap();
        assert_eq!(movement.total_cost, Money::from_cents(6000));

        let current = f.reload(&item).await;
        assert_eq!(current.quantity_total(), 21);
        assert_eq!(current.cost_price(), Money::from_cents(300));
        assert_eq!(current.last_cost_price(), Money::from_cents(250));
    }

    #[tokio::test]
    async fn create_rejects_duplicates_and_unknown_references() {
        let f = fixture();
        let w1 = f.warehouse("W1", 1).await;
        let product = ProductId::new();
        f.item(product, &w1, 1, 0).await;

        let err = f
            .engine
            .create_item(new_item(product, w1.id, 1, 0), "tester")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "duplicate_item");

        let err = f
            .engine
            .create_item(new_item(product, WarehouseId::new(), 1, 0), "tester")
            .await
            .unwrap_err();
        assert!(matches!(err, InventoryError::WarehouseNotFound(_)));

        let strict = fixture_with(EngineSettings::default(), InMemoryProductCatalog::new());
        let w = strict.warehouse("W1", 1).await;
        let err = strict
            .engine
            .create_item(new_item(ProductId::new(), w.id, 1, 0), "tester")
            .await
            .unwrap_err();
        assert!(matches!(err, InventoryError::ProductNotFound(_)));
    }

    #[tokio::test]
    async fn create_rejects_cost_too_large_to_extend() {
        let f = fixture();
        let w1 = f.warehouse("W1", 1).await;
        let mut new = new_item(ProductId::new(), w1.id, 3, 0);
        new.cost_price = Money::from_cents(i64::MAX / 2);

        let err = f.engine.create_item(new.clone(), "tester").await.unwrap_err();
        assert!(matches!(err, InventoryError::Validation(_)));
        assert!(f.engine.items().get_by_key(&new.key()).await.unwrap().is_none());

        new.cost_price = Money::from_cents(250);
        let item = f.engine.create_item(new, "tester").await.unwrap();
        f.assert_ledger_matches(&item).await;
    }

    #[tokio::test]
    async fn adjustment_sign_follows_movement_type() {
        let f = fixture();
        let w1 = f.warehouse("W1", 1).await;
        let item = f.item(ProductId::new(), &w1, 10, 0).await;

        let err = f
            .engine
            .adjust_stock(item.id(), AdjustStockRequest::new(5, MovementType::Damaged, "broken"))
            .await
            .unwrap_err();
        assert!(matches!(err, InventoryError::InvalidQuantity(_)));

        let err = f
            .engine
            .adjust_stock(item.id(), AdjustStockRequest::new(-5, MovementType::Returned, "rma"))
            .await
            .unwrap_err();
        assert!(matches!(err, InventoryError::InvalidQuantity(_)));
        assert_eq!(f.reload(&item).await.quantity_total(), 10);

        f.engine
            .adjust_stock(item.id(), AdjustStockRequest::new(-4, MovementType::Adjustment, "count"))
            .await
            .unwrap();
        assert_eq!(f.reload(&item).await.quantity_total(), 6);
        f.assert_ledger_matches(&item).await;
    }

    #[tokio::test]
    async fn update_and_backorder() {
        let f = fixture();
        let w1 = f.warehouse("W1", 1).await;
        let item = f.item(ProductId::new(), &w1, 0, 5).await;
        assert_eq!(item.status(), StockStatus::OutOfStock);

        let updated = f
            .engine
            .items()
            .update(
                item.id(),
                ItemUpdate {
                    location: Some("A-01".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.location(), Some("A-01"));

        let backordered = f.engine.items().mark_backorder(item.id()).await.unwrap();
        assert_eq!(backordered.status(), StockStatus::Backorder);

        f.engine
            .adjust_stock(item.id(), AdjustStockRequest::new(50, MovementType::Inbound, "restock"))
            .await
            .unwrap();
        assert_eq!(f.reload(&item).await.status(), StockStatus::InStock);

        let err = f.engine.items().mark_backorder(item.id()).await.unwrap_err();
        assert!(matches!(err, InventoryError::Validation(_)));
    }

    #[tokio::test]
    async fn delete_blocked_by_active_reservation() {
        let f = fixture();
        let w1 = f.warehouse("W1", 1).await;
        let product = ProductId::new();
        let item = f.item(product, &w1, 10, 0).await;
        let reservations = f
            .engine
            .reserve(ReserveRequest::new(product, OrderId::new(), 2))
            .await
            .unwrap();

        let err = f.engine.items().delete(item.id()).await.unwrap_err();
        assert!(matches!(err, InventoryError::ItemHasActiveReservations(_)));

        f.engine.release(reservations[0].id, "tester").await.unwrap();
        f.engine.items().delete(item.id()).await.unwrap();
        assert!(matches!(
            f.engine.items().get(item.id()).await,
            Err(InventoryError::InventoryNotFound(_))
        ));
    }
}

mod reservations {
    use super::*;

    #[tokio::test]
    async fn splits_across_warehouses_by_priority() {
        let f = fixture();
        let product = ProductId::new();
        let w3 = f.warehouse("W3", 3).await;
        let w1 = f.warehouse("W1", 1).await;
        let w2 = f.warehouse("W2", 2).await;
        f.item(product, &w1, 5, 0).await;
        f.item(product, &w2, 4, 0).await;
        f.item(product, &w3, 3, 0).await;

        let availability = f
            .engine
            .check_availability(AvailabilityRequest {
                product_id: product,
                variant_id: None,
                quantity: 12,
                warehouse_id: None,
            })
            .await
            .unwrap();
        assert!(availability.is_available);
        assert_eq!(availability.total_available, 12);

        let order_id = OrderId::new();
        let reservations = f
            .engine
            .reserve(ReserveRequest::new(product, order_id, 12))
            .await
            .unwrap();
        let split: Vec<_> = reservations.iter().map(|r| (r.warehouse_id, r.quantity)).collect();
        assert_eq!(split, vec![(w1.id, 5), (w2.id, 4), (w3.id, 3)]);

        let notices = f.orders.allocations_for(order_id).await;
        assert_eq!(notices.len(), 3);
    }

    #[tokio::test]
    async fn insufficient_stock_changes_nothing() {
        let f = fixture();
        let product = ProductId::new();
        let w1 = f.warehouse("W1", 1).await;
        let w2 = f.warehouse("W2", 2).await;
        let a = f.item(product, &w1, 5, 0).await;
        let b = f.item(product, &w2, 6, 0).await;

        let err = f
            .engine
            .reserve(ReserveRequest::new(product, OrderId::new(), 12))
            .await
            .unwrap_err();
        assert!(matches!(err, InventoryError::InsufficientStock { requested: 12, available: 11 }));

        assert_eq!(f.reload(&a).await.quantity_available(), 5);
        assert_eq!(f.reload(&b).await.quantity_available(), 6);
    }

    #[tokio::test]
    async fn preferred_warehouse_used_when_sufficient() {
        let f = fixture();
        let product = ProductId::new();
        let w1 = f.warehouse("W1", 1).await;
        let w2 = f.warehouse("W2", 2).await;
        f.item(product, &w1, 10, 0).await;
        f.item(product, &w2, 10, 0).await;

        let mut request = ReserveRequest::new(product, OrderId::new(), 5);
        request.preferred_warehouse = Some(w2.id);
        let reservations = f.engine.reserve(request).await.unwrap();
        assert_eq!(reservations.len(), 1);
        assert_eq!(reservations[0].warehouse_id, w2.id);

        let mut request = ReserveRequest::new(product, OrderId::new(), 8);
        request.preferred_warehouse = Some(w2.id);
        let reservations = f.engine.reserve(request).await.unwrap();
        assert_eq!(reservations[0].warehouse_id, w1.id);
    }

    #[tokio::test]
    async fn inactive_warehouses_are_not_allocated() {
        let f = fixture();
        let product = ProductId::new();
        let w1 = f.warehouse("W1", 1).await;
        f.item(product, &w1, 10, 0).await;
        f.engine
            .warehouses()
            .update(
                w1.id,
                WarehouseUpdate {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let err = f
            .engine
            .reserve(ReserveRequest::new(product, OrderId::new(), 1))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "insufficient_stock");
    }

    #[tokio::test]
    async fn release_is_idempotent() {
        let f = fixture();
        let product = ProductId::new();
        let w1 = f.warehouse("W1", 1).await;
        let item = f.item(product, &w1, 10, 0).await;
        let reservations = f
            .engine
            .reserve(ReserveRequest::new(product, OrderId::new(), 4))
            .await
            .unwrap();
        let id = reservations[0].id;

        assert!(f.engine.release(id, "tester").await.unwrap());
        assert!(!f.engine.release(id, "tester").await.unwrap());

        let current = f.reload(&item).await;
        assert_eq!(current.quantity_available(), 10);
        assert_eq!(current.quantity_reserved(), 0);

        let reservation = f.engine.reservations().get(id).await.unwrap();
        assert_eq!(reservation.state, ReservationState::Released);
        assert!(reservation.released_at.is_some());

        let err = f.engine.fulfill(id, "tester").await.unwrap_err();
        assert_eq!(err.code(), "reservation_inactive");
        f.assert_ledger_matches(&item).await;
    }

    #[tokio::test]
    async fn unknown_reservation_is_not_found() {
        let f = fixture();
        let id = common::ReservationId::new();
        assert_eq!(f.engine.release(id, "x").await.unwrap_err().code(), "reservation_not_found");
        assert_eq!(f.engine.fulfill(id, "x").await.unwrap_err().code(), "reservation_not_found");
    }

    #[tokio::test]
    async fn ttl_outside_bounds_is_rejected() {
        let f = fixture();
        let product = ProductId::new();
        let w1 = f.warehouse("W1", 1).await;
        f.item(product, &w1, 10, 0).await;

        let mut request = ReserveRequest::new(product, OrderId::new(), 1);
        request.ttl_hours = Some(169);
        assert!(f.engine.reserve(request).await.is_err());
    }

    #[tokio::test]
    async fn expired_reservation_is_swept_back_to_available() {
        let f = fixture();
        let product = ProductId::new();
        let w1 = f.warehouse("W1", 1).await;
        let item = f.item(product, &w1, 10, 0).await;

        let mut request = ReserveRequest::new(product, OrderId::new(), 3);
        request.ttl_hours = Some(1);
        let reservation = f.engine.reserve(request).await.unwrap().remove(0);
        assert_eq!(reservation.expires_at, start_time() + Duration::hours(1));

        f.clock.advance(Duration::hours(2));

        let err = f.engine.fulfill(reservation.id, "shipping").await.unwrap_err();
        assert!(matches!(err, InventoryError::ReservationExpired(_)));

        let report = f.engine.sweep_expired().await.unwrap();
        assert_eq!(report.scanned, 1);
        assert_eq!(report.expired, 1);
        assert_eq!(report.failed, 0);

        let swept = f.engine.reservations().get(reservation.id).await.unwrap();
        assert_eq!(swept.state, ReservationState::Expired);
        assert_eq!(f.reload(&item).await.quantity_available(), 10);

        let again = f.engine.sweep_expired().await.unwrap();
        assert_eq!(again.scanned, 0);
        f.assert_ledger_matches(&item).await;
    }

    #[tokio::test]
    async fn order_level_release_and_fulfill() {
        let f = fixture();
        let p1 = ProductId::new();
        let p2 = ProductId::new();
        let w1 = f.warehouse("W1", 1).await;
        let a = f.item(p1, &w1, 10, 0).await;
        let b = f.item(p2, &w1, 10, 0).await;

        let order = OrderId::new();
        f.engine.reserve(ReserveRequest::new(p1, order, 2)).await.unwrap();
        f.engine.reserve(ReserveRequest::new(p2, order, 3)).await.unwrap();
        assert_eq!(f.engine.reservations().for_order(order).await.unwrap().len(), 2);

        assert_eq!(f.engine.reservations().release_order(order, "tester").await.unwrap(), 2);
        assert_eq!(f.engine.reservations().release_order(order, "tester").await.unwrap(), 0);

        let order = OrderId::new();
        f.engine.reserve(ReserveRequest::new(p1, order, 4)).await.unwrap();
        let fulfilled = f
            .engine
            .reservations()
            .fulfill_order(order, "tester")
            .await
            .unwrap();
        assert_eq!(fulfilled.len(), 1);
        assert_eq!(f.reload(&a).await.quantity_total(), 6);
        assert_eq!(f.reload(&b).await.quantity_total(), 10);

        let updates = f.orders.status_updates().await;
        assert!(updates.iter().any(|u| u.order_id == order && u.status == "fulfilled"));
    }

    #[tokio::test]
    async fn lookup_by_code() {
        let f = fixture();
        let product = ProductId::new();
        let w1 = f.warehouse("W1", 1).await;
        f.item(product, &w1, 10, 0).await;
        let reservation = f
            .engine
            .reserve(ReserveRequest::new(product, OrderId::new(), 1))
            .await
            .unwrap()
            .remove(0);

        let found = f
            .engine
            .reservations()
            .get_by_code(&reservation.code)
            .await
            .unwrap();
        assert_eq!(found.id, reservation.id);
        assert!(reservation.code.starts_with("RSV-"));
    }

    #[tokio::test]
    async fn bulk_reserve_reports_each_line() {
        let f = fixture();
        let p1 = ProductId::new();
        let p2 = ProductId::new();
        let w1 = f.warehouse("W1", 1).await;
        f.item(p1, &w1, 10, 0).await;
        f.item(p2, &w1, 1, 0).await;

        let line = |product_id, quantity| BulkReserveLine {
            product_id,
            variant_id: None,
            quantity,
            reserved_price: Money::zero(),
            preferred_warehouse: None,
        };
        let outcome = f
            .engine
            .reservations()
            .bulk_reserve(BulkReserveRequest {
                order_id: OrderId::new(),
                lines: vec![line(p1, 3), line(p2, 5)],
                ttl_hours: None,
                actor: "tester".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(outcome.succeeded, 1);
        assert_eq!(outcome.failed, 1);
        assert!(outcome.lines[0].is_success());
        assert!(!outcome.lines[1].is_success());
    }

    #[tokio::test]
    async fn order_system_failure_does_not_fail_reservation() {
        let f = fixture();
        let product = ProductId::new();
        let w1 = f.warehouse("W1", 1).await;
        f.item(product, &w1, 10, 0).await;
        f.orders.set_fail(true).await;

        let reservations = f
            .engine
            .reserve(ReserveRequest::new(product, OrderId::new(), 1))
            .await
            .unwrap();
        f.engine.fulfill(reservations[0].id, "shipping").await.unwrap();
    }
}

mod transfers {
    use super::*;

    fn transfer(product_id: ProductId, from: &Warehouse, to: &Warehouse, quantity: u32) -> TransferRequest {
        TransferRequest {
            product_id,
            variant_id: None,
            from_warehouse: from.id,
            to_warehouse: to.id,
            quantity,
            reason: "rebalance".to_string(),
            actor: "ops".to_string(),
        }
    }

    #[tokio::test]
    async fn creates_destination_and_links_movements() {
        let f = fixture();
        let product = ProductId::new();
        let w1 = f.warehouse("W1", 1).await;
        let w2 = f.warehouse("W2", 2).await;
        let source = f.item(product, &w1, 10, 2).await;

        let result = f.engine.transfer(transfer(product, &w1, &w2, 4)).await.unwrap();
        assert_eq!(result.outbound.quantity, -4);
        assert_eq!(result.inbound.quantity, 4);
        assert_eq!(result.outbound.movement_type, MovementType::Transfer);
        assert_eq!(result.outbound.unit_cost, Money::from_cents(250));
        assert_eq!(result.outbound.total_cost, Money::from_cents(1000));
        assert_eq!(result.inbound.total_cost, Money::from_cents(1000));

        let destination = f
            .engine
            .items()
            .get(result.inbound.inventory_item_id)
            .await
            .unwrap();
        assert_eq!(destination.warehouse_id(), w2.id);
        assert_eq!(destination.quantity_total(), 4);
        assert_eq!(destination.sku(), source.sku());
        assert_eq!(destination.reorder_point(), 2);
        assert_eq!(result.outbound.reference_id, Some(destination.id().as_uuid()));
        assert_eq!(result.inbound.reference_id, Some(source.id().as_uuid()));

        assert_eq!(f.reload(&source).await.quantity_total(), 6);
        f.assert_ledger_matches(&source).await;
        f.assert_ledger_matches(&destination).await;

        f.engine.transfer(transfer(product, &w2, &w1, 4)).await.unwrap();
        assert_eq!(f.reload(&source).await.quantity_total(), 10);
    }

    #[tokio::test]
    async fn rejects_missing_source_and_short_stock() {
        let f = fixture();
        let product = ProductId::new();
        let w1 = f.warehouse("W1", 1).await;
        let w2 = f.warehouse("W2", 2).await;

        let err = f.engine.transfer(transfer(product, &w1, &w2, 1)).await.unwrap_err();
        assert!(matches!(err, InventoryError::InventoryNotFound(_)));

        let source = f.item(product, &w1, 3, 0).await;
        let err = f.engine.transfer(transfer(product, &w1, &w2, 5)).await.unwrap_err();
        assert!(matches!(err, InventoryError::InsufficientStock { .. }));
        assert_eq!(f.reload(&source).await.quantity_total(), 3);

        let err = f.engine.transfer(transfer(product, &w1, &w1, 1)).await.unwrap_err();
        assert!(matches!(err, InventoryError::Validation(_)));
    }
}

mod ledger_consistency {
    use super::*;

    #[tokio::test]
    async fn failed_initial_write_is_reconciled() {
        let f = fixture();
        let w1 = f.warehouse("W1", 1).await;

        f.ledger.fail_writes(true);
        let item = f.item(ProductId::new(), &w1, 40, 0).await;
        f.ledger.fail_writes(false);

        let replay = f.engine.ledger().replay(item.id()).await.unwrap();
        assert_eq!(replay.total, 0);

        let report = f.engine.items().reconcile(item.id(), "auditor").await.unwrap();
        assert!(!report.was_consistent());
        let correction = report.correction.unwrap();
        assert_eq!(correction.quantity, 40);
        assert_eq!(correction.reference_type.as_deref(), Some("reconciliation"));
        f.assert_ledger_matches(&item).await;

        let again = f.engine.items().reconcile(item.id(), "auditor").await.unwrap();
        assert!(again.was_consistent());
    }

    #[tokio::test]
    async fn rejected_ledger_write_rolls_back_quantities() {
        let f = fixture();
        let product = ProductId::new();
        let w1 = f.warehouse("W1", 1).await;
        let item = f.item(product, &w1, 10, 0).await;

        f.ledger.fail_writes(true);
        assert!(
            f.engine
                .adjust_stock(item.id(), AdjustStockRequest::new(5, MovementType::Inbound, "po"))
                .await
                .is_err()
        );
        assert!(
            f.engine
                .reserve(ReserveRequest::new(product, OrderId::new(), 4))
                .await
                .is_err()
        );
        f.ledger.fail_writes(false);

        let current = f.reload(&item).await;
        assert_eq!(current.quantity_total(), 10);
        assert_eq!(current.quantity_available(), 10);
        f.assert_ledger_matches(&item).await;

        // The stock is still reservable after the failed attempt.
        f.engine
            .reserve(ReserveRequest::new(product, OrderId::new(), 10))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn top_moved_products_ranks_by_units() {
        let f = fixture();
        let busy = ProductId::new();
        let quiet = ProductId::new();
        let w1 = f.warehouse("W1", 1).await;
        let busy_item = f.item(busy, &w1, 50, 0).await;
        f.item(quiet, &w1, 5, 0).await;
        f.engine
            .adjust_stock(busy_item.id(), AdjustStockRequest::new(-10, MovementType::Outbound, "sale"))
            .await
            .unwrap();

        let top = f
            .engine
            .reports()
            .top_moved_products(start_time() - Duration::days(1), start_time() + Duration::days(1), 10)
            .await
            .unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].product_id, busy);
        assert_eq!(top[0].inbound, 50);
        assert_eq!(top[0].outbound, 10);

        let summary = f
            .engine
            .reports()
            .movement_summary(start_time() - Duration::days(1), start_time() + Duration::days(1))
            .await
            .unwrap();
        assert_eq!(summary.total_movements, 3);
        assert_eq!(summary.net_change, 45);
    }
}

mod alerts {
    use super::*;

    async fn stocked(f: &Fixture) {
        let w1 = f.warehouse("W1", 1).await;
        f.item(ProductId::new(), &w1, 100, 10).await;
        f.item(ProductId::new(), &w1, 4, 10).await;
        f.item(ProductId::new(), &w1, 0, 10).await;
    }

    #[tokio::test]
    async fn scan_counts_and_creates_alerts() {
        let f = fixture();
        stocked(&f).await;

        let report = f.engine.generate_alerts().await.unwrap();
        assert_eq!(report.alerts_created, 2);
        assert_eq!(report.low_stock_count, 1);
        assert_eq!(report.out_of_stock_count, 1);

        let out = f
            .engine
            .alerts()
            .list(&AlertQuery {
                alert_type: Some(AlertType::OutOfStock),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(out.total, 1);
        assert!(out.items[0].message.contains("completely out of stock"));

        // Cumulative: a second scan records the same conditions again.
        let again = f.engine.generate_alerts().await.unwrap();
        assert_eq!(again.alerts_created, 2);
    }

    #[tokio::test]
    async fn skip_unresolved_policy_dedups_until_resolved() {
        let settings = EngineSettings {
            alert_dedup: AlertDedupPolicy::SkipUnresolved,
            alert_batch_size: 1,
            ..Default::default()
        };
        let f = fixture_with(settings, InMemoryProductCatalog::accept_all());
        stocked(&f).await;

        assert_eq!(f.engine.generate_alerts().await.unwrap().alerts_created, 2);
        let second = f.engine.generate_alerts().await.unwrap();
        assert_eq!(second.alerts_created, 0);
        assert_eq!(second.skipped, 2);

        let all = f.engine.alerts().list(&AlertQuery::default()).await.unwrap();
        let ids: Vec<_> = all.items.iter().map(|a| a.id).collect();
        let resolved = f.engine.alerts().bulk_resolve(&ids).await;
        assert!(resolved.all_succeeded());

        assert_eq!(f.engine.generate_alerts().await.unwrap().alerts_created, 2);
    }

    #[tokio::test]
    async fn backordered_empty_item_alerts_out_of_stock() {
        let f = fixture();
        let w1 = f.warehouse("W1", 1).await;
        let item = f.item(ProductId::new(), &w1, 0, 5).await;
        f.engine.items().mark_backorder(item.id()).await.unwrap();

        let report = f.engine.generate_alerts().await.unwrap();
        assert_eq!(report.alerts_created, 1);
        assert_eq!(report.out_of_stock_count, 1);

        let page = f.engine.alerts().list(&AlertQuery::default()).await.unwrap();
        assert_eq!(page.items[0].alert_type, AlertType::OutOfStock);
        assert_eq!(page.items[0].inventory_item_id, item.id());
    }

    #[tokio::test]
    async fn read_and_resolve_flip_state() {
        let f = fixture();
        stocked(&f).await;
        f.engine.generate_alerts().await.unwrap();

        let page = f.engine.alerts().list(&AlertQuery::default()).await.unwrap();
        let id = page.items[0].id;

        let read = f.engine.alerts().mark_read(id).await.unwrap();
        assert!(read.is_read);
        assert!(read.read_at.is_some());

        let resolved = f.engine.alerts().resolve(id).await.unwrap();
        assert!(resolved.is_resolved);

        let unresolved = f
            .engine
            .alerts()
            .list(&AlertQuery {
                unresolved_only: true,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(unresolved.total, 1);

        let purged = f
            .engine
            .alerts()
            .purge_resolved_before(start_time() + Duration::days(2))
            .await
            .unwrap();
        assert_eq!(purged, 1);

        let missing = f.engine.alerts().mark_read(common::AlertId::new()).await.unwrap_err();
        assert_eq!(missing.code(), "alert_not_found");
    }
}

mod warehouses {
    use super::*;

    #[tokio::test]
    async fn default_flag_moves() {
        let f = fixture();
        let mut first = NewWarehouse::new("A", "Alpha", 1);
        first.is_default = true;
        let a = f.engine.warehouses().create(first).await.unwrap();

        let mut second = NewWarehouse::new("B", "Beta", 2);
        second.is_default = true;
        let b = f.engine.warehouses().create(second).await.unwrap();

        let default = f.engine.warehouses().default_warehouse().await.unwrap().unwrap();
        assert_eq!(default.id, b.id);
        assert!(!f.engine.warehouses().get(a.id).await.unwrap().is_default);
    }

    #[tokio::test]
    async fn duplicate_code_and_delete_rules() {
        let f = fixture();
        let w1 = f.warehouse("W1", 1).await;
        let err = f
            .engine
            .warehouses()
            .create(NewWarehouse::new("W1", "Again", 1))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "duplicate_warehouse");

        f.item(ProductId::new(), &w1, 30, 0).await;
        let capacity = f.engine.warehouses().capacity(w1.id).await.unwrap();
        assert_eq!(capacity.utilization.used, 30);
        assert_eq!(capacity.totals.items, 1);

        let err = f.engine.warehouses().delete(w1.id).await.unwrap_err();
        assert!(matches!(err, InventoryError::Validation(_)));

        let empty = f.warehouse("W2", 2).await;
        f.engine.warehouses().delete(empty.id).await.unwrap();
        assert_eq!(f.engine.warehouses().list(false).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn summary_counts_statuses() {
        let f = fixture();
        let w1 = f.warehouse("W1", 1).await;
        f.item(ProductId::new(), &w1, 100, 10).await;
        f.item(ProductId::new(), &w1, 3, 10).await;
        f.item(ProductId::new(), &w1, 0, 10).await;

        let summary = f.engine.reports().warehouse_summary(w1.id).await.unwrap();
        assert_eq!(summary.totals.items, 3);
        assert_eq!(summary.low_stock_items, 1);
        assert_eq!(summary.out_of_stock_items, 1);
    }
}
