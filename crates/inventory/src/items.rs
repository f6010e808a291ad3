//! Inventory Item Store operations: lifecycle, manual adjustments, transfers
//! and ledger reconciliation.

use common::{ItemId, WarehouseId};
use domain::{
    InventoryError, InventoryItem, ItemFilter, ItemKey, ItemUpdate, NewInventoryItem, Page,
    PageRequest, Result,
};
use ledger::{MovementQuery, MovementStoreExt, MovementType, StockMovement, reference};
use serde::{Deserialize, Serialize};

use crate::context::{InventoryContext, LoadedItem};
use crate::requests::{
    AdjustStockRequest, BulkAdjustRequest, BulkOutcome, LineOutcome, TransferRequest,
};

/// The two ledger entries written by a transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferResult {
    pub outbound: StockMovement,
    pub inbound: StockMovement,
}

/// Outcome of comparing an item's ledger with its stored total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub item_id: ItemId,
    pub ledger_total: i64,
    pub quantity_total: i64,
    /// Set when a correcting adjustment had to be appended.
    pub correction: Option<StockMovement>,
}

impl ReconcileReport {
    pub fn was_consistent(&self) -> bool {
        self.correction.is_none()
    }
}

/// Per-item operations of the inventory store.
#[derive(Clone)]
pub struct ItemService {
    ctx: InventoryContext,
}

impl ItemService {
    pub fn new(ctx: InventoryContext) -> Self {
        Self { ctx }
    }

    /// Creates an item. Initial stock is written to the ledger on a best-effort
    /// basis; [`ItemService::reconcile`] closes any gap left by a failed write.
    #[tracing::instrument(skip(self, new), fields(product_id = %new.product_id, warehouse_id = %new.warehouse_id))]
    pub async fn create(&self, new: NewInventoryItem, actor: &str) -> Result<InventoryItem> {
        new.validate()?;

        if self.ctx.warehouses.get(new.warehouse_id).await?.is_none() {
            return Err(InventoryError::warehouse_not_found(new.warehouse_id));
        }
        if !self.ctx.catalog.exists(new.product_id, new.variant_id).await? {
            return Err(InventoryError::ProductNotFound(new.product_id.to_string()));
        }
        if self.ctx.items.get_by_key(&new.key()).await?.is_some() {
            return Err(InventoryError::duplicate_item(
                new.product_id,
                new.variant_id,
                new.warehouse_id,
            ));
        }

        let now = self.ctx.now();
        let item = InventoryItem::create(new, now)?;
        self.ctx.items.insert(item.clone()).await?;

        if item.quantity_total() > 0 {
            let quantity = item.quantity_total() as i64;
            let movement = StockMovement::builder(item.id(), MovementType::Inbound)
                .quantity(quantity)
                .totals(0, quantity)
                .reference_type(reference::INITIAL_STOCK)
                .reason("initial stock")
                .unit_cost(item.cost_price())
                .actor(actor)
                .movement_date(now)
                .build();
            if let Err(e) = self.ctx.record(movement).await {
                tracing::warn!(item_id = %item.id(), error = %e, "failed to record initial stock movement");
            }
        }

        tracing::info!(item_id = %item.id(), sku = item.sku(), "inventory item created");
        Ok(item)
    }

    pub async fn get(&self, item_id: ItemId) -> Result<InventoryItem> {
        self.ctx.find_item(item_id).await
    }

    pub async fn get_by_key(&self, key: &ItemKey) -> Result<Option<InventoryItem>> {
        self.ctx.items.get_by_key(key).await
    }

    pub async fn find_by_sku(&self, sku: &str) -> Result<Vec<InventoryItem>> {
        self.ctx.items.find_by_sku(sku).await
    }

    pub async fn find_by_barcode(&self, barcode: &str) -> Result<Vec<InventoryItem>> {
        self.ctx.items.find_by_barcode(barcode).await
    }

    pub async fn list(&self, filter: &ItemFilter, page: PageRequest) -> Result<Page<InventoryItem>> {
        self.ctx.items.list(filter, page).await
    }

    #[tracing::instrument(skip(self, update))]
    pub async fn update(&self, item_id: ItemId, update: ItemUpdate) -> Result<InventoryItem> {
        update.validate()?;

        let _guard = self.ctx.locks.lock(item_id).await;
        let mut loaded = self.ctx.load_for_update(item_id).await?;
        loaded.item.apply_update(update, self.ctx.now())?;
        self.ctx.save(&loaded).await?;
        Ok(loaded.item)
    }

    /// Deletes an item that no active reservation refers to.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, item_id: ItemId) -> Result<()> {
        let guard = self.ctx.locks.lock(item_id).await;

        let active = self.ctx.reservations.find_by_item(item_id, true).await?;
        if !active.is_empty() {
            return Err(InventoryError::ItemHasActiveReservations(item_id));
        }
        if !self.ctx.items.delete(item_id).await? {
            return Err(InventoryError::item_not_found(item_id));
        }

        drop(guard);
        self.ctx.locks.forget(item_id);
        tracing::info!(%item_id, "inventory item deleted");
        Ok(())
    }

    /// Flags an empty item as backordered.
    #[tracing::instrument(skip(self))]
    pub async fn mark_backorder(&self, item_id: ItemId) -> Result<InventoryItem> {
        let _guard = self.ctx.locks.lock(item_id).await;
        let mut loaded = self.ctx.load_for_update(item_id).await?;
        loaded.item.mark_backorder(self.ctx.now())?;
        self.ctx.save(&loaded).await?;
        Ok(loaded.item)
    }

    /// Applies a manual stock change and records it.
    #[tracing::instrument(skip(self, request), fields(quantity = request.quantity, movement_type = %request.movement_type))]
    pub async fn adjust(&self, item_id: ItemId, request: AdjustStockRequest) -> Result<StockMovement> {
        request.validate()?;

        let _guard = self.ctx.locks.lock(item_id).await;
        let mut loaded = self.ctx.load_for_update(item_id).await?;
        let now = self.ctx.now();

        if request.quantity > 0 {
            loaded
                .item
                .add_stock(request.magnitude(), Some(request.unit_cost), now)?;
        } else {
            loaded.item.remove_stock(request.magnitude(), now)?;
        }

        let mut builder = StockMovement::builder(item_id, request.movement_type)
            .quantity(request.quantity)
            .totals(loaded.original_total(), loaded.total())
            .reference_type(reference::ADJUSTMENT)
            .reason(request.reason)
            .unit_cost(request.unit_cost)
            .actor(request.actor)
            .movement_date(now);
        if let Some(notes) = request.notes {
            builder = builder.notes(notes);
        }

        let movement = self.ctx.commit(&loaded, builder.build()).await?;
        metrics::counter!("inventory_stock_adjustments_total").increment(1);
        tracing::info!(%item_id, new_total = loaded.total(), "stock adjusted");
        Ok(movement)
    }

    /// Adjusts several items independently; one line failing does not stop the rest.
    #[tracing::instrument(skip(self, request), fields(lines = request.lines.len()))]
    pub async fn bulk_adjust(&self, request: BulkAdjustRequest) -> Result<BulkOutcome<StockMovement>> {
        request.validate()?;

        let mut lines = Vec::with_capacity(request.lines.len());
        for (index, line) in request.lines.iter().enumerate() {
            let result = self.adjust(line.item_id, request.line_request(line)).await;
            if let Err(ref e) = result {
                tracing::warn!(index, item_id = %line.item_id, error = %e, "bulk adjustment line failed");
            }
            lines.push(LineOutcome::from_result(index, result));
        }
        Ok(BulkOutcome::from_lines(lines))
    }

    /// Moves available stock between two warehouses.
    ///
    /// Both items are locked in ascending id order; the destination item is
    /// created on demand from the source's thresholds, SKU and cost.
    #[tracing::instrument(skip(self, request), fields(product_id = %request.product_id, quantity = request.quantity))]
    pub async fn transfer(&self, request: TransferRequest) -> Result<TransferResult> {
        request.validate()?;

        for warehouse_id in [request.from_warehouse, request.to_warehouse] {
            self.require_warehouse(warehouse_id).await?;
        }

        let source_key = ItemKey::new(request.product_id, request.variant_id, request.from_warehouse);
        let source = self.ctx.items.get_by_key(&source_key).await?.ok_or_else(|| {
            InventoryError::InventoryNotFound(format!(
                "product {} in warehouse {}",
                request.product_id, request.from_warehouse
            ))
        })?;
        let destination_id = self.destination_for(&source, request.to_warehouse).await?;

        let _guards = self
            .ctx
            .locks
            .lock_many(&[source.id(), destination_id])
            .await;
        let mut from = self.ctx.load_for_update(source.id()).await?;
        let mut to = self.ctx.load_for_update(destination_id).await?;
        let now = self.ctx.now();

        from.item.remove_stock(request.quantity, now)?;
        to.item.add_stock(request.quantity, None, now)?;

        let quantity = request.quantity as i64;
        let outbound = self
            .transfer_movement(&from, -quantity, destination_id, &request)
            .unit_cost(from.item.cost_price())
            .movement_date(now)
            .build();
        let inbound = self
            .transfer_movement(&to, quantity, source.id(), &request)
            .unit_cost(from.item.cost_price())
            .movement_date(now)
            .build();

        self.ctx.save(&from).await?;
        if let Err(e) = self.ctx.save(&to).await {
            self.ctx.restore(&from).await;
            return Err(e);
        }
        if let Err(e) = self.ctx.record(outbound.clone()).await {
            self.ctx.restore(&to).await;
            self.ctx.restore(&from).await;
            return Err(e);
        }
        if let Err(e) = self.ctx.record(inbound.clone()).await {
            self.ctx.restore(&to).await;
            self.ctx.restore(&from).await;
            self.reverse_outbound(&from, quantity, destination_id, &request)
                .await;
            return Err(e);
        }

        metrics::counter!("inventory_transfers_total").increment(1);
        tracing::info!(
            from_item = %source.id(),
            to_item = %destination_id,
            quantity,
            "stock transferred"
        );
        Ok(TransferResult { outbound, inbound })
    }

    /// Replays the item's ledger and appends a correcting adjustment when
    /// the replayed total differs from the stored one.
    #[tracing::instrument(skip(self))]
    pub async fn reconcile(&self, item_id: ItemId, actor: &str) -> Result<ReconcileReport> {
        let _guard = self.ctx.locks.lock(item_id).await;
        let item = self.ctx.find_item(item_id).await?;
        let replay = self.ctx.ledger.replay(item_id).await?;
        let quantity_total = item.quantity_total() as i64;

        if !replay.is_continuous() {
            tracing::warn!(%item_id, breaks = replay.breaks.len(), "ledger continuity breaks found");
        }
        if replay.matches(quantity_total) {
            return Ok(ReconcileReport {
                item_id,
                ledger_total: replay.total,
                quantity_total,
                correction: None,
            });
        }

        let correction = StockMovement::builder(item_id, MovementType::Adjustment)
            .quantity(quantity_total - replay.total)
            .totals(replay.total, quantity_total)
            .reference_type(reference::RECONCILIATION)
            .reason("ledger reconciliation")
            .unit_cost(item.cost_price())
            .actor(actor)
            .movement_date(self.ctx.now())
            .build();
        self.ctx.record(correction.clone()).await?;

        tracing::warn!(
            %item_id,
            ledger_total = replay.total,
            quantity_total,
            "ledger reconciled with correcting adjustment"
        );
        Ok(ReconcileReport {
            item_id,
            ledger_total: replay.total,
            quantity_total,
            correction: Some(correction),
        })
    }

    /// Ledger entries of one item, narrowed by `query`.
    pub async fn movements(&self, item_id: ItemId, query: MovementQuery) -> Result<Vec<StockMovement>> {
        self.ctx.find_item(item_id).await?;
        Ok(self.ctx.ledger.query(query.item(item_id)).await?)
    }

    async fn require_warehouse(&self, warehouse_id: WarehouseId) -> Result<()> {
        match self.ctx.warehouses.get(warehouse_id).await? {
            Some(_) => Ok(()),
            None => Err(InventoryError::warehouse_not_found(warehouse_id)),
        }
    }

    async fn destination_for(&self, source: &InventoryItem, warehouse_id: WarehouseId) -> Result<ItemId> {
        let key = ItemKey::new(source.product_id(), source.variant_id(), warehouse_id);
        if let Some(existing) = self.ctx.items.get_by_key(&key).await? {
            return Ok(existing.id());
        }

        let created = source.empty_copy_at(warehouse_id, self.ctx.now());
        match self.ctx.items.insert(created.clone()).await {
            Ok(()) => {
                tracing::info!(item_id = %created.id(), %warehouse_id, "destination item created for transfer");
                Ok(created.id())
            }
            // Lost a race with another transfer creating the same item.
            Err(InventoryError::DuplicateItem { .. }) => self
                .ctx
                .items
                .get_by_key(&key)
                .await?
                .map(|item| item.id())
                .ok_or_else(|| InventoryError::Storage(format!("item for {key:?} vanished"))),
            Err(e) => Err(e),
        }
    }

    fn transfer_movement(
        &self,
        loaded: &LoadedItem,
        quantity: i64,
        counterpart: ItemId,
        request: &TransferRequest,
    ) -> ledger::MovementBuilder {
        StockMovement::builder(loaded.item.id(), MovementType::Transfer)
            .quantity(quantity)
            .totals(loaded.original_total(), loaded.total())
            .reference(reference::TRANSFER, counterpart.as_uuid())
            .reason(request.reason.clone())
            .actor(request.actor.clone())
    }

    /// Cancels a recorded outbound transfer entry after the rest of the transfer failed.
    async fn reverse_outbound(
        &self,
        from: &LoadedItem,
        quantity: i64,
        counterpart: ItemId,
        request: &TransferRequest,
    ) {
        let total = from.original_total();
        let reversal = StockMovement::builder(from.item.id(), MovementType::Transfer)
            .quantity(quantity)
            .totals(total - quantity, total)
            .reference(reference::TRANSFER, counterpart.as_uuid())
            .reason("transfer rolled back")
            .unit_cost(from.item.cost_price())
            .actor(request.actor.clone())
            .movement_date(self.ctx.now())
            .build();
        if let Err(e) = self.ctx.record(reversal).await {
            tracing::error!(item_id = %from.item.id(), error = %e, "failed to reverse outbound transfer entry");
        }
    }
}
