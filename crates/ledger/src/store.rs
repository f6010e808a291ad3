use std::pin::Pin;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{ItemId, MovementId};
use futures_core::Stream;
use uuid::Uuid;

use crate::{LedgerError, MovementQuery, MovementSummary, Replay, Result, StockMovement};

/// A stream of movements.
pub type MovementStream = Pin<Box<dyn Stream<Item = Result<StockMovement>> + Send>>;

/// Core trait for ledger storage.
///
/// The ledger is append-only: apart from the retention purge there is no way
/// to change or remove a recorded movement. All implementations must be
/// thread-safe (Send + Sync).
#[async_trait]
pub trait MovementStore: Send + Sync {
    /// Records a movement and returns its id.
    ///
    /// Only the movement's own consistency is checked; the store never looks
    /// at the state of the item it describes.
    async fn record(&self, movement: StockMovement) -> Result<MovementId>;

    /// Gets a movement by id.
    async fn get(&self, id: MovementId) -> Result<Option<StockMovement>>;

    /// Retrieves all movements for an item, in recording order.
    async fn movements_for_item(&self, item_id: ItemId) -> Result<Vec<StockMovement>>;

    /// Retrieves movements matching a query.
    async fn query(&self, query: MovementQuery) -> Result<Vec<StockMovement>>;

    /// Counts movements matching a query (paging ignored).
    async fn count(&self, query: MovementQuery) -> Result<u64>;

    /// Streams the whole ledger in recording order.
    async fn stream_all(&self) -> Result<MovementStream>;

    /// Deletes movements dated strictly before `cutoff`. Returns the number removed.
    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;
}

/// Extension trait providing convenience methods for movement stores.
#[async_trait]
pub trait MovementStoreExt: MovementStore {
    /// Retrieves every movement attached to a reference.
    async fn movements_by_reference(
        &self,
        reference_type: &str,
        reference_id: Uuid,
    ) -> Result<Vec<StockMovement>> {
        self.query(MovementQuery::for_reference(reference_type, reference_id))
            .await
    }

    /// Replays an item's ledger.
    async fn replay(&self, item_id: ItemId) -> Result<Replay> {
        let movements = self.movements_for_item(item_id).await?;
        Ok(Replay::from_movements(item_id, &movements))
    }

    /// Summarizes movements in an inclusive date range.
    async fn summarize(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<MovementSummary> {
        let movements = self.query(MovementQuery::new().between(from, to)).await?;
        Ok(MovementSummary::from_movements(from, to, &movements))
    }
}

// Blanket implementation for all MovementStore implementations
impl<T: MovementStore + ?Sized> MovementStoreExt for T {}

/// Validates a movement before recording.
///
/// Totals are never negative. Reservation movements leave the total unchanged;
/// every other movement's quantity equals the change in total.
pub fn validate_movement(movement: &StockMovement) -> Result<()> {
    if movement.previous_quantity < 0 || movement.new_quantity < 0 {
        return Err(LedgerError::InvalidMovement(format!(
            "totals must be non-negative (previous {}, new {})",
            movement.previous_quantity, movement.new_quantity
        )));
    }

    if movement.movement_type.is_reservation() {
        if movement.previous_quantity != movement.new_quantity {
            return Err(LedgerError::InvalidMovement(format!(
                "{} movement must not change the total ({} -> {})",
                movement.movement_type, movement.previous_quantity, movement.new_quantity
            )));
        }
    } else if movement.quantity != movement.delta() {
        return Err(LedgerError::InvalidMovement(format!(
            "quantity {} does not match total change {} -> {}",
            movement.quantity, movement.previous_quantity, movement.new_quantity
        )));
    }

    Ok(())
}
