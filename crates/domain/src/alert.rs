//! Low and out-of-stock alerts.

use chrono::{DateTime, Utc};
use common::{AlertId, ItemId, ProductId, WarehouseId};
use serde::{Deserialize, Serialize};

use crate::{InventoryItem, PageRequest, StockStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    LowStock,
    OutOfStock,
}

impl AlertType {
    /// Alert type raised by a status, if any.
    pub fn for_status(status: StockStatus) -> Option<Self> {
        match status {
            StockStatus::LowStock => Some(AlertType::LowStock),
            StockStatus::OutOfStock => Some(AlertType::OutOfStock),
            StockStatus::InStock | StockStatus::Backorder => None,
        }
    }

    pub fn severity(&self) -> AlertSeverity {
        match self {
            AlertType::LowStock => AlertSeverity::Medium,
            AlertType::OutOfStock => AlertSeverity::High,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::LowStock => "low_stock",
            AlertType::OutOfStock => "out_of_stock",
        }
    }
}

impl std::fmt::Display for AlertType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Low => "low",
            AlertSeverity::Medium => "medium",
            AlertSeverity::High => "high",
            AlertSeverity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAlert {
    pub id: AlertId,
    pub inventory_item_id: ItemId,
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub message: String,
    pub is_read: bool,
    pub is_resolved: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl StockAlert {
    pub fn for_item(item: &InventoryItem, alert_type: AlertType, now: DateTime<Utc>) -> Self {
        let message = match alert_type {
            AlertType::LowStock => format!(
                "Low stock alert: SKU {} has only {} units remaining",
                item.sku(),
                item.quantity_total()
            ),
            AlertType::OutOfStock => {
                format!("Out of stock alert: SKU {} is completely out of stock", item.sku())
            }
        };

        Self {
            id: AlertId::new(),
            inventory_item_id: item.id(),
            product_id: item.product_id(),
            warehouse_id: item.warehouse_id(),
            alert_type,
            severity: alert_type.severity(),
            message,
            is_read: false,
            is_resolved: false,
            read_at: None,
            resolved_at: None,
            created_at: now,
        }
    }

    /// Returns false if already read.
    pub fn mark_read(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_read {
            return false;
        }
        self.is_read = true;
        self.read_at = Some(now);
        true
    }

    /// Resolving also marks the alert read. Returns false if already resolved.
    pub fn resolve(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_resolved {
            return false;
        }
        self.mark_read(now);
        self.is_resolved = true;
        self.resolved_at = Some(now);
        true
    }
}

/// Filter for listing alerts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertQuery {
    pub item_id: Option<ItemId>,
    pub warehouse_id: Option<WarehouseId>,
    pub alert_type: Option<AlertType>,
    pub severity: Option<AlertSeverity>,
    #[serde(default)]
    pub unread_only: bool,
    #[serde(default)]
    pub unresolved_only: bool,
    #[serde(default)]
    pub page: PageRequest,
}

impl AlertQuery {
    pub fn matches(&self, alert: &StockAlert) -> bool {
        if let Some(item_id) = self.item_id
            && alert.inventory_item_id != item_id
        {
            return false;
        }
        if let Some(warehouse_id) = self.warehouse_id
            && alert.warehouse_id != warehouse_id
        {
            return false;
        }
        if let Some(alert_type) = self.alert_type
            && alert.alert_type != alert_type
        {
            return false;
        }
        if let Some(severity) = self.severity
            && alert.severity != severity
        {
            return false;
        }
        if self.unread_only && alert.is_read {
            return false;
        }
        if self.unresolved_only && alert.is_resolved {
            return false;
        }
        true
    }
}
