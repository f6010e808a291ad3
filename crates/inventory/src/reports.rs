//! Read-only reports over the ledger and the item store.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common::{ProductId, VariantId, WarehouseId};
use domain::{
    CapacityUtilization, InventoryError, ItemFilter, PageRequest, Result, StockStatus,
    WarehouseStockTotals,
};
use ledger::{ItemMovementStats, MovementQuery, MovementStoreExt, MovementSummary};
use serde::{Deserialize, Serialize};

use crate::context::InventoryContext;

const SCAN_PAGE_SIZE: usize = 500;

/// Movement totals of one product variant across every warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductMovementStats {
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub movements: u64,
    pub inbound: i64,
    pub outbound: i64,
}

impl ProductMovementStats {
    pub fn moved(&self) -> i64 {
        self.inbound + self.outbound
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseSummary {
    pub warehouse_id: WarehouseId,
    pub code: String,
    pub totals: WarehouseStockTotals,
    pub utilization: CapacityUtilization,
    pub low_stock_items: u64,
    pub out_of_stock_items: u64,
    pub backorder_items: u64,
}

#[derive(Clone)]
pub struct ReportService {
    ctx: InventoryContext,
}

impl ReportService {
    pub fn new(ctx: InventoryContext) -> Self {
        Self { ctx }
    }

    pub async fn movement_summary(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<MovementSummary> {
        Ok(self.ctx.ledger.summarize(from, to).await?)
    }

    /// Product variants with the most units moved in the range, busiest first.
    /// Movements of items that no longer exist are left out.
    #[tracing::instrument(skip(self))]
    pub async fn top_moved_products(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ProductMovementStats>> {
        let movements = self
            .ctx
            .ledger
            .query(MovementQuery::new().between(from, to))
            .await?;

        let mut grouped: HashMap<(ProductId, Option<VariantId>), ProductMovementStats> =
            HashMap::new();
        for stats in ItemMovementStats::per_item(&movements) {
            let Some(item) = self.ctx.items.get(stats.item_id).await? else {
                tracing::debug!(item_id = %stats.item_id, "skipping movements of deleted item");
                continue;
            };
            let entry = grouped
                .entry((item.product_id(), item.variant_id()))
                .or_insert(ProductMovementStats {
                    product_id: item.product_id(),
                    variant_id: item.variant_id(),
                    movements: 0,
                    inbound: 0,
                    outbound: 0,
                });
            entry.movements += stats.movements;
            entry.inbound += stats.inbound;
            entry.outbound += stats.outbound;
        }

        let mut ranked: Vec<_> = grouped.into_values().collect();
        ranked.sort_by(|a, b| {
            b.moved()
                .cmp(&a.moved())
                .then(b.movements.cmp(&a.movements))
                .then(a.product_id.cmp(&b.product_id))
        });
        ranked.truncate(limit);
        Ok(ranked)
    }

    pub async fn warehouse_summary(&self, warehouse_id: WarehouseId) -> Result<WarehouseSummary> {
        let warehouse = self
            .ctx
            .warehouses
            .get(warehouse_id)
            .await?
            .ok_or_else(|| InventoryError::warehouse_not_found(warehouse_id))?;
        let totals = self.ctx.items.warehouse_totals(warehouse_id).await?;

        let mut summary = WarehouseSummary {
            warehouse_id,
            utilization: warehouse.utilization(totals.quantity_total),
            code: warehouse.code,
            totals,
            low_stock_items: 0,
            out_of_stock_items: 0,
            backorder_items: 0,
        };

        let filter = ItemFilter::warehouse(warehouse_id);
        let mut page = PageRequest::first(SCAN_PAGE_SIZE);
        loop {
            let batch = self.ctx.items.list(&filter, page).await?;
            for item in &batch.items {
                match item.status() {
                    StockStatus::LowStock => summary.low_stock_items += 1,
                    StockStatus::OutOfStock => summary.out_of_stock_items += 1,
                    StockStatus::Backorder => summary.backorder_items += 1,
                    StockStatus::InStock => {}
                }
            }
            if batch.len() < page.limit {
                break;
            }
            page = page.next();
        }
        Ok(summary)
    }
}
