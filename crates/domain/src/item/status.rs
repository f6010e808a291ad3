//! Stock status of an inventory item.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::InventoryError;

/// Stock level classification.
///
/// `InStock`, `LowStock` and `OutOfStock` are derived from quantities by
/// [`derive_status`]. `Backorder` is only ever set explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    #[default]
    InStock,
    LowStock,
    OutOfStock,
    Backorder,
}

impl StockStatus {
    /// Returns true if the item should raise an alert.
    pub fn needs_attention(&self) -> bool {
        matches!(self, StockStatus::LowStock | StockStatus::OutOfStock)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::InStock => "in_stock",
            StockStatus::LowStock => "low_stock",
            StockStatus::OutOfStock => "out_of_stock",
            StockStatus::Backorder => "backorder",
        }
    }
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StockStatus {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_stock" => Ok(StockStatus::InStock),
            "low_stock" => Ok(StockStatus::LowStock),
            "out_of_stock" => Ok(StockStatus::OutOfStock),
            "backorder" => Ok(StockStatus::Backorder),
            other => Err(InventoryError::validation(format!(
                "unknown stock status: {other}"
            ))),
        }
    }
}

/// Derives the status from the on-hand total and the reorder point.
pub fn derive_status(quantity_total: u32, reorder_point: u32) -> StockStatus {
    if quantity_total == 0 {
        StockStatus::OutOfStock
    } else if quantity_total <= reorder_point {
        StockStatus::LowStock
    } else {
        StockStatus::InStock
    }
}
