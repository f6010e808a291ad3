//! Per-item mutual exclusion.
//!
//! Every quantity mutation on an item runs while holding that item's lock,
//! so two reservations can never both read the same available quantity.
//! Operations touching several items take their locks in ascending id order.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use common::ItemId;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Guard held while an item is being mutated.
pub type ItemGuard = OwnedMutexGuard<()>;

/// Registry of one async mutex per inventory item.
#[derive(Debug, Default)]
pub struct ItemLocks {
    locks: Mutex<HashMap<ItemId, Arc<AsyncMutex<()>>>>,
}

impl ItemLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, item_id: ItemId) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(item_id).or_default().clone()
    }

    /// Waits for exclusive access to one item.
    pub async fn lock(&self, item_id: ItemId) -> ItemGuard {
        self.handle(item_id).lock_owned().await
    }

    /// Locks several items in ascending id order. Duplicates are locked once.
    pub async fn lock_many(&self, item_ids: &[ItemId]) -> Vec<ItemGuard> {
        let mut ids = item_ids.to_vec();
        ids.sort();
        ids.dedup();

        let mut guards = Vec::with_capacity(ids.len());
        for id in ids {
            guards.push(self.lock(id).await);
        }
        guards
    }

    /// Drops the lock entry of a deleted item.
    pub fn forget(&self, item_id: ItemId) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.remove(&item_id);
    }

    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
