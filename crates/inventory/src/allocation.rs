//! Allocation Planner: splits a requested quantity across warehouses.
//!
//! Candidates are ranked by warehouse priority (lower first), then by
//! available quantity (higher first), then by item id so the order is
//! total. Allocation is first-fit greedy over that ranking.

use std::collections::HashMap;

use common::{ItemId, ProductId, VariantId, WarehouseId};
use domain::{InventoryItem, Result, Warehouse};
use serde::{Deserialize, Serialize};

use crate::context::InventoryContext;

/// Stock of the requested product at one warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseStock {
    pub warehouse_id: WarehouseId,
    pub warehouse_code: String,
    pub priority: i32,
    pub item_id: ItemId,
    pub quantity_available: u32,
    pub quantity_reserved: u32,
}

impl WarehouseStock {
    pub fn new(warehouse: &Warehouse, item: &InventoryItem) -> Self {
        Self {
            warehouse_id: warehouse.id,
            warehouse_code: warehouse.code.clone(),
            priority: warehouse.priority,
            item_id: item.id(),
            quantity_available: item.quantity_available(),
            quantity_reserved: item.quantity_reserved(),
        }
    }
}

/// Quantity to take from one warehouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationLine {
    pub warehouse_id: WarehouseId,
    pub item_id: ItemId,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub requested: u32,
    pub total_available: u64,
    pub total_reserved: u64,
    /// True when the suggestion covers the full requested quantity.
    pub is_available: bool,
    /// Candidates in ranking order.
    pub per_warehouse: Vec<WarehouseStock>,
    pub allocation_suggestion: Vec<AllocationLine>,
}

impl Availability {
    pub fn allocated(&self) -> u64 {
        self.allocation_suggestion
            .iter()
            .map(|line| line.quantity as u64)
            .sum()
    }
}

/// Ranks candidates and allocates `requested` greedily.
pub fn plan_allocation(mut stock: Vec<WarehouseStock>, requested: u32) -> Availability {
    stock.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then(b.quantity_available.cmp(&a.quantity_available))
            .then(a.item_id.cmp(&b.item_id))
    });

    let mut remaining = requested;
    let mut suggestion = Vec::new();
    for candidate in &stock {
        if remaining == 0 {
            break;
        }
        let take = remaining.min(candidate.quantity_available);
        if take == 0 {
            continue;
        }
        suggestion.push(AllocationLine {
            warehouse_id: candidate.warehouse_id,
            item_id: candidate.item_id,
            quantity: take,
        });
        remaining -= take;
    }

    Availability {
        requested,
        total_available: stock.iter().map(|s| s.quantity_available as u64).sum(),
        total_reserved: stock.iter().map(|s| s.quantity_reserved as u64).sum(),
        is_available: remaining == 0 && requested > 0,
        per_warehouse: stock,
        allocation_suggestion: suggestion,
    }
}

#[derive(Clone)]
pub struct AllocationPlanner {
    ctx: InventoryContext,
}

impl AllocationPlanner {
    pub fn new(ctx: InventoryContext) -> Self {
        Self { ctx }
    }

    /// Gathers the product's stock in active warehouses (optionally one)
    /// and plans an allocation for `quantity`.
    #[tracing::instrument(skip(self))]
    pub async fn suggest(
        &self,
        product_id: ProductId,
        variant_id: Option<VariantId>,
        quantity: u32,
        warehouse_filter: Option<WarehouseId>,
    ) -> Result<Availability> {
        let warehouses: HashMap<WarehouseId, Warehouse> = self
            .ctx
            .warehouses
            .list(true)
            .await?
            .into_iter()
            .map(|w| (w.id, w))
            .collect();

        let stock = self
            .ctx
            .items
            .find_for_product(product_id, variant_id)
            .await?
            .iter()
            .filter(|item| warehouse_filter.is_none_or(|id| item.warehouse_id() == id))
            .filter_map(|item| {
                warehouses
                    .get(&item.warehouse_id())
                    .map(|w| WarehouseStock::new(w, item))
            })
            .collect();

        let availability = plan_allocation(stock, quantity);
        tracing::debug!(
            total_available = availability.total_available,
            is_available = availability.is_available,
            "allocation planned"
        );
        Ok(availability)
    }
}
