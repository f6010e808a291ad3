//! Inventory error taxonomy.

use common::{ItemId, ProductId, ReservationId, VariantId, WarehouseId};
use ledger::LedgerError;
use thiserror::Error;

use crate::ReservationState;

/// Broad category of an error, used by transports to pick a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Invalid,
    Internal,
}

/// Errors that can occur during inventory operations.
///
/// Every variant has a stable, transport-independent code (see [`InventoryError::code`]);
/// the `Display` output is the human-readable message.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Requested quantity exceeds available stock.
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: u64, available: u64 },

    /// Non-positive quantity, or one exceeding reserved/total where required.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Inventory item not found: {0}")]
    InventoryNotFound(String),

    #[error("Warehouse not found: {0}")]
    WarehouseNotFound(String),

    #[error("Reservation not found: {0}")]
    ReservationNotFound(String),

    /// The reservation's hold time has passed.
    #[error("Reservation {0} has expired")]
    ReservationExpired(ReservationId),

    /// The reservation already reached a terminal state.
    #[error("Reservation {id} is no longer active ({state})")]
    ReservationInactive {
        id: ReservationId,
        state: ReservationState,
    },

    #[error("Alert not found: {0}")]
    AlertNotFound(String),

    #[error("Reservation with code {0} already exists")]
    DuplicateReservation(String),

    #[error("Inventory item already exists for product {product_id} (variant {variant}) in warehouse {warehouse_id}")]
    DuplicateItem {
        product_id: ProductId,
        variant: String,
        warehouse_id: WarehouseId,
    },

    #[error("Warehouse with code {0} already exists")]
    DuplicateWarehouse(String),

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Inventory item {0} has active reservations")]
    ItemHasActiveReservations(ItemId),

    /// Request failed input validation.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Stored item changed between read and write.
    #[error("Concurrency conflict on item {item_id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        item_id: ItemId,
        expected: u64,
        actual: u64,
    },

    /// An external collaborator call failed.
    #[error("Collaborator error: {0}")]
    Collaborator(String),

    #[error("Storage error: {0}")]
    Storage(String),

    /// Engine construction is missing a required component.
    #[error("Missing component: {0}")]
    MissingComponent(&'static str),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

impl InventoryError {
    pub fn invalid_quantity(message: impl Into<String>) -> Self {
        Self::InvalidQuantity(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn item_not_found(id: ItemId) -> Self {
        Self::InventoryNotFound(id.to_string())
    }

    pub fn warehouse_not_found(id: WarehouseId) -> Self {
        Self::WarehouseNotFound(id.to_string())
    }

    pub fn reservation_not_found(id: ReservationId) -> Self {
        Self::ReservationNotFound(id.to_string())
    }

    pub fn duplicate_item(
        product_id: ProductId,
        variant_id: Option<VariantId>,
        warehouse_id: WarehouseId,
    ) -> Self {
        Self::DuplicateItem {
            product_id,
            variant: variant_id.map_or_else(|| "none".to_string(), |v| v.to_string()),
            warehouse_id,
        }
    }

    /// Stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InsufficientStock { .. } => "insufficient_stock",
            Self::InvalidQuantity(_) => "invalid_quantity",
            Self::InventoryNotFound(_) => "inventory_not_found",
            Self::WarehouseNotFound(_) => "warehouse_not_found",
            Self::ReservationNotFound(_) => "reservation_not_found",
            Self::ReservationExpired(_) => "reservation_expired",
            Self::ReservationInactive { .. } => "reservation_inactive",
            Self::AlertNotFound(_) => "alert_not_found",
            Self::DuplicateReservation(_) => "duplicate_reservation",
            Self::DuplicateItem { .. } => "duplicate_item",
            Self::DuplicateWarehouse(_) => "duplicate_warehouse",
            Self::ProductNotFound(_) => "product_not_found",
            Self::ItemHasActiveReservations(_) => "item_has_active_reservations",
            Self::Validation(_) => "validation_error",
            Self::ConcurrencyConflict { .. } => "concurrency_conflict",
            Self::Collaborator(_) => "collaborator_error",
            Self::Storage(_) => "storage_error",
            Self::MissingComponent(_) => "missing_component",
            Self::Ledger(_) => "ledger_error",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InventoryNotFound(_)
            | Self::WarehouseNotFound(_)
            | Self::ReservationNotFound(_)
            | Self::AlertNotFound(_)
            | Self::ProductNotFound(_) => ErrorKind::NotFound,
            Self::InsufficientStock { .. }
            | Self::ReservationExpired(_)
            | Self::ReservationInactive { .. }
            | Self::DuplicateReservation(_)
            | Self::DuplicateItem { .. }
            | Self::DuplicateWarehouse(_)
            | Self::ItemHasActiveReservations(_)
            | Self::ConcurrencyConflict { .. } => ErrorKind::Conflict,
            Self::InvalidQuantity(_) | Self::Validation(_) => ErrorKind::Invalid,
            Self::Collaborator(_)
            | Self::Storage(_)
            | Self::MissingComponent(_)
            | Self::Ledger(_) => ErrorKind::Internal,
        }
    }
}

/// Result type for inventory operations.
pub type Result<T> = std::result::Result<T, InventoryError>;
