use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{ItemId, MovementId};
use tokio::sync::RwLock;

use crate::{
    MovementQuery, Result, StockMovement,
    store::{MovementStore, MovementStream, validate_movement},
};

/// In-memory movement store.
///
/// Movements are kept in a vector in recording order, which is the ledger
/// order for every query.
#[derive(Clone, Default)]
pub struct InMemoryMovementStore {
    movements: Arc<RwLock<Vec<StockMovement>>>,
}

impl InMemoryMovementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of movements stored.
    pub async fn movement_count(&self) -> usize {
        self.movements.read().await.len()
    }

    pub async fn clear(&self) {
        self.movements.write().await.clear();
    }
}

#[async_trait]
impl MovementStore for InMemoryMovementStore {
    async fn record(&self, movement: StockMovement) -> Result<MovementId> {
        validate_movement(&movement)?;

        let id = movement.id;
        tracing::debug!(
            movement_id = %id,
            item_id = %movement.inventory_item_id,
            movement_type = %movement.movement_type,
            quantity = movement.quantity,
            "Recording movement"
        );
        self.movements.write().await.push(movement);
        metrics::counter!("ledger_movements_recorded_total").increment(1);
        Ok(id)
    }

    async fn get(&self, id: MovementId) -> Result<Option<StockMovement>> {
        let store = self.movements.read().await;
        Ok(store.iter().find(|m| m.id == id).cloned())
    }

    async fn movements_for_item(&self, item_id: ItemId) -> Result<Vec<StockMovement>> {
        let store = self.movements.read().await;
        Ok(store
            .iter()
            .filter(|m| m.inventory_item_id == item_id)
            .cloned()
            .collect())
    }

    async fn query(&self, query: MovementQuery) -> Result<Vec<StockMovement>> {
        let store = self.movements.read().await;
        let mut movements: Vec<_> = store.iter().filter(|m| query.matches(m)).cloned().collect();

        if query.newest_first {
            movements.reverse();
        }

        let offset = query.offset.unwrap_or(0);
        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(movements.into_iter().skip(offset).take(limit).collect())
    }

    async fn count(&self, query: MovementQuery) -> Result<u64> {
        let store = self.movements.read().await;
        Ok(store.iter().filter(|m| query.matches(m)).count() as u64)
    }

    async fn stream_all(&self) -> Result<MovementStream> {
        use futures_util::stream;

        let movements = self.movements.read().await.clone();
        let stream = stream::iter(movements.into_iter().map(Ok));
        Ok(Box::pin(stream))
    }

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut store = self.movements.write().await;
        let before = store.len();
        store.retain(|m| m.movement_date >= cutoff);
        let purged = (before - store.len()) as u64;
        tracing::info!(purged, %cutoff, "Purged movements");
        Ok(purged)
    }
}
