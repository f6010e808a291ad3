//! Fulfillment locations.

use chrono::{DateTime, Utc};
use common::WarehouseId;
use serde::{Deserialize, Serialize};

use crate::{InventoryError, Result};

pub const DEFAULT_CAPACITY: u64 = 10_000;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_country() -> String {
    "US".to_string()
}

fn default_true() -> bool {
    true
}

fn default_capacity() -> u64 {
    DEFAULT_CAPACITY
}

/// Input for registering a warehouse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWarehouse {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub address: Address,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_capacity")]
    pub capacity: u64,
    #[serde(default)]
    pub manager_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl NewWarehouse {
    /// Minimal warehouse input with defaults for everything optional.
    pub fn new(code: impl Into<String>, name: impl Into<String>, priority: i32) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            description: None,
            address: Address::default(),
            is_active: true,
            is_default: false,
            priority,
            capacity: DEFAULT_CAPACITY,
            manager_name: None,
            phone: None,
            email: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.code.trim().is_empty() {
            return Err(InventoryError::validation("warehouse code is required"));
        }
        if self.name.trim().is_empty() {
            return Err(InventoryError::validation("warehouse name is required"));
        }
        if self.capacity < 1 {
            return Err(InventoryError::validation("capacity must be at least 1"));
        }
        Ok(())
    }
}

/// Partial warehouse update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WarehouseUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<Address>,
    pub is_active: Option<bool>,
    pub is_default: Option<bool>,
    pub priority: Option<i32>,
    pub capacity: Option<u64>,
    pub manager_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// A fulfillment location. Lower `priority` is preferred for allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: WarehouseId,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub address: Address,
    pub is_active: bool,
    pub is_default: bool,
    pub priority: i32,
    pub capacity: u64,
    pub manager_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Warehouse {
    pub fn create(new: NewWarehouse, now: DateTime<Utc>) -> Result<Self> {
        new.validate()?;
        Ok(Self {
            id: WarehouseId::new(),
            code: new.code.trim().to_string(),
            name: new.name,
            description: new.description,
            address: new.address,
            is_active: new.is_active,
            is_default: new.is_default,
            priority: new.priority,
            capacity: new.capacity,
            manager_name: new.manager_name,
            phone: new.phone,
            email: new.email,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply_update(&mut self, update: WarehouseUpdate, now: DateTime<Utc>) -> Result<()> {
        if let Some(ref name) = update.name
            && name.trim().is_empty()
        {
            return Err(InventoryError::validation("warehouse name is required"));
        }
        if update.capacity == Some(0) {
            return Err(InventoryError::validation("capacity must be at least 1"));
        }

        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = Some(description);
        }
        if let Some(address) = update.address {
            self.address = address;
        }
        if let Some(is_active) = update.is_active {
            self.is_active = is_active;
        }
        if let Some(is_default) = update.is_default {
            self.is_default = is_default;
        }
        if let Some(priority) = update.priority {
            self.priority = priority;
        }
        if let Some(capacity) = update.capacity {
            self.capacity = capacity;
        }
        if let Some(manager_name) = update.manager_name {
            self.manager_name = Some(manager_name);
        }
        if let Some(phone) = update.phone {
            self.phone = Some(phone);
        }
        if let Some(email) = update.email {
            self.email = Some(email);
        }
        self.updated_at = now;
        Ok(())
    }

    /// Capacity usage given the sum of item totals stored here.
    pub fn utilization(&self, used: u64) -> CapacityUtilization {
        CapacityUtilization {
            warehouse_id: self.id,
            capacity: self.capacity,
            used,
            available: self.capacity.saturating_sub(used),
            utilization_percent: if self.capacity == 0 {
                0.0
            } else {
                used as f64 / self.capacity as f64 * 100.0
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityUtilization {
    pub warehouse_id: WarehouseId,
    pub capacity: u64,
    pub used: u64,
    pub available: u64,
    pub utilization_percent: f64,
}
