//! Concurrency tests: quantity mutations on one item are serialized and
//! multi-item operations cannot deadlock.

use std::sync::Arc;
use std::time::Duration;

use common::{Money, OrderId, ProductId};
use domain::{InventoryError, NewInventoryItem, NewWarehouse};
use futures_util::future::join_all;
use inventory::{
    InMemoryOrderSystem, InMemoryProductCatalog, InventoryEngine, ReserveRequest, TransferRequest,
};
use ledger::MovementStoreExt;

fn engine() -> InventoryEngine {
    InventoryEngine::builder()
        .in_memory_storage()
        .catalog(Arc::new(InMemoryProductCatalog::accept_all()))
        .orders(Arc::new(InMemoryOrderSystem::new()))
        .build()
        .unwrap()
}

fn stock(product_id: ProductId, warehouse_id: common::WarehouseId, quantity: u32) -> NewInventoryItem {
    NewInventoryItem {
        product_id,
        variant_id: None,
        warehouse_id,
        initial_quantity: quantity,
        min_stock_level: 0,
        max_stock_level: 10_000,
        reorder_point: 0,
        sku: "SKU-CONC".to_string(),
        barcode: None,
        location: None,
        cost_price: Money::zero(),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_reserves_never_oversell() {
    const AVAILABLE: u32 = 7;
    const CALLERS: usize = 40;

    let engine = engine();
    let warehouse = engine
        .warehouses()
        .create(NewWarehouse::new("W1", "Main", 1))
        .await
        .unwrap();
    let product = ProductId::new();
    let item = engine
        .create_item(stock(product, warehouse.id, AVAILABLE), "tester")
        .await
        .unwrap();

    let tasks = (0..CALLERS).map(|_| {
        let engine = engine.clone();
        tokio::spawn(async move {
            engine
                .reserve(ReserveRequest::new(product, OrderId::new(), 1))
                .await
        })
    });
    let results: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let successes = results.iter().filter(|r| r.is_ok()).count();
    let insufficient = results
        .iter()
        .filter(|r| matches!(r, Err(InventoryError::InsufficientStock { .. })))
        .count();
    assert_eq!(successes, AVAILABLE as usize);
    assert_eq!(insufficient, CALLERS - AVAILABLE as usize);

    let current = engine.items().get(item.id()).await.unwrap();
    assert_eq!(current.quantity_available(), 0);
    assert_eq!(current.quantity_reserved(), AVAILABLE);
    assert!(current.is_consistent());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_release_and_fulfill_apply_once() {
    let engine = engine();
    let warehouse = engine
        .warehouses()
        .create(NewWarehouse::new("W1", "Main", 1))
        .await
        .unwrap();
    let product = ProductId::new();
    let item = engine
        .create_item(stock(product, warehouse.id, 10), "tester")
        .await
        .unwrap();
    let reservation = engine
        .reserve(ReserveRequest::new(product, OrderId::new(), 4))
        .await
        .unwrap()
        .remove(0);

    let releases = (0..10).map(|_| {
        let engine = engine.clone();
        tokio::spawn(async move { engine.release(reservation.id, "tester").await })
    });
    let released = join_all(releases)
        .await
        .into_iter()
        .filter(|joined| matches!(joined, Ok(Ok(true))))
        .count();
    assert_eq!(released, 1);

    let current = engine.items().get(item.id()).await.unwrap();
    assert_eq!(current.quantity_available(), 10);
    assert_eq!(current.quantity_reserved(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn opposite_transfers_do_not_deadlock() {
    let engine = engine();
    let east = engine
        .warehouses()
        .create(NewWarehouse::new("EAST", "East", 1))
        .await
        .unwrap();
    let west = engine
        .warehouses()
        .create(NewWarehouse::new("WEST", "West", 2))
        .await
        .unwrap();
    let product = ProductId::new();
    let east_item = engine
        .create_item(stock(product, east.id, 500), "tester")
        .await
        .unwrap();
    let west_item = engine
        .create_item(stock(product, west.id, 500), "tester")
        .await
        .unwrap();

    let transfer = |from: common::WarehouseId, to: common::WarehouseId| TransferRequest {
        product_id: product,
        variant_id: None,
        from_warehouse: from,
        to_warehouse: to,
        quantity: 1,
        reason: "rebalance".to_string(),
        actor: "tester".to_string(),
    };

    let tasks = (0..100).map(|i| {
        let engine = engine.clone();
        let request = if i % 2 == 0 {
            transfer(east.id, west.id)
        } else {
            transfer(west.id, east.id)
        };
        tokio::spawn(async move { engine.transfer(request).await })
    });

    let results = tokio::time::timeout(Duration::from_secs(10), join_all(tasks))
        .await
        .expect("transfers deadlocked");
    assert!(results.into_iter().all(|joined| joined.unwrap().is_ok()));

    let east_now = engine.items().get(east_item.id()).await.unwrap();
    let west_now = engine.items().get(west_item.id()).await.unwrap();
    assert_eq!(east_now.quantity_total(), 500);
    assert_eq!(west_now.quantity_total(), 500);

    for item in [&east_now, &west_now] {
        let replay = engine.ledger().replay(item.id()).await.unwrap();
        assert!(replay.is_continuous());
        assert_eq!(replay.total, 500);
    }
}
