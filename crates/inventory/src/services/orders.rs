//! Order system port. Calls are notifications: the engine logs failures and
//! never turns them into inventory errors.

use std::sync::Arc;

use async_trait::async_trait;
use common::{ItemId, OrderId, ReservationId, WarehouseId};
use domain::{InventoryError, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// One reservation made for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationNotice {
    pub reservation_id: ReservationId,
    pub item_id: ItemId,
    pub warehouse_id: WarehouseId,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockStatusUpdate {
    pub order_id: OrderId,
    pub status: String,
    pub details: String,
}

#[async_trait]
pub trait OrderSystem: Send + Sync {
    async fn notify_allocation(&self, order_id: OrderId, allocations: &[AllocationNotice]) -> Result<()>;

    async fn update_stock_status(&self, order_id: OrderId, status: &str, details: &str) -> Result<()>;
}

#[derive(Debug, Default)]
struct OrderSystemState {
    allocations: Vec<(OrderId, Vec<AllocationNotice>)>,
    status_updates: Vec<StockStatusUpdate>,
    fail: bool,
}

/// In-memory order system that records what it was told.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderSystem {
    state: Arc<RwLock<OrderSystemState>>,
}

impl InMemoryOrderSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call fail.
    pub async fn set_fail(&self, fail: bool) {
        self.state.write().await.fail = fail;
    }

    pub async fn allocations_for(&self, order_id: OrderId) -> Vec<AllocationNotice> {
        self.state
            .read()
            .await
            .allocations
            .iter()
            .filter(|(id, _)| *id == order_id)
            .flat_map(|(_, notices)| notices.iter().cloned())
            .collect()
    }

    pub async fn status_updates(&self) -> Vec<StockStatusUpdate> {
        self.state.read().await.status_updates.clone()
    }
}

#[async_trait]
impl OrderSystem for InMemoryOrderSystem {
    async fn notify_allocation(&self, order_id: OrderId, allocations: &[AllocationNotice]) -> Result<()> {
        let mut state = self.state.write().await;
        if state.fail {
            return Err(InventoryError::Collaborator("order system unavailable".to_string()));
        }
        state.allocations.push((order_id, allocations.to_vec()));
        Ok(())
    }

    async fn update_stock_status(&self, order_id: OrderId, status: &str, details: &str) -> Result<()> {
        let mut state = self.state.write().await;
        if state.fail {
            return Err(InventoryError::Collaborator("order system unavailable".to_string()));
        }
        state.status_updates.push(StockStatusUpdate {
            order_id,
            status: status.to_string(),
            details: details.to_string(),
        });
        Ok(())
    }
}
