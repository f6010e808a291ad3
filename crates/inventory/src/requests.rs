//! Inputs of the exposed operations and their validation rules.
//!
//! Validation runs before any store is touched.

use common::{ItemId, Money, OrderId, ProductId, VariantId, WarehouseId};
use domain::{InventoryError, Result};
use ledger::MovementType;
use serde::{Deserialize, Serialize};

fn default_actor() -> String {
    "system".to_string()
}

fn require_text(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(InventoryError::validation(format!("{field} is required")));
    }
    Ok(())
}

fn require_unit_amount(value: Money, field: &str) -> Result<()> {
    if value.is_negative() {
        return Err(InventoryError::validation(format!("{field} must not be negative")));
    }
    if !value.fits_any_quantity() {
        return Err(InventoryError::validation(format!("{field} is too large")));
    }
    Ok(())
}

/// Manual stock adjustment on one item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustStockRequest {
    /// Positive adds stock, negative removes available stock.
    pub quantity: i64,
    pub movement_type: MovementType,
    pub reason: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub unit_cost: Money,
    #[serde(default = "default_actor")]
    pub actor: String,
}

impl AdjustStockRequest {
    pub fn new(quantity: i64, movement_type: MovementType, reason: impl Into<String>) -> Self {
        Self {
            quantity,
            movement_type,
            reason: reason.into(),
            notes: None,
            unit_cost: Money::zero(),
            actor: default_actor(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.quantity == 0 {
            return Err(InventoryError::invalid_quantity("adjustment quantity must not be 0"));
        }
        if self.quantity.unsigned_abs() > u32::MAX as u64 {
            return Err(InventoryError::invalid_quantity("adjustment quantity is too large"));
        }
        if !self.movement_type.is_manual_adjustment() {
            return Err(InventoryError::validation(format!(
                "{} movements cannot be recorded as an adjustment",
                self.movement_type
            )));
        }
        match self.movement_type {
            MovementType::Inbound | MovementType::Returned if self.quantity < 0 => {
                return Err(InventoryError::invalid_quantity(format!(
                    "{} quantity must be positive",
                    self.movement_type
                )));
            }
            MovementType::Outbound | MovementType::Damaged if self.quantity > 0 => {
                return Err(InventoryError::invalid_quantity(format!(
                    "{} quantity must be negative",
                    self.movement_type
                )));
            }
            _ => {}
        }
        require_text(&self.reason, "reason")?;
        require_text(&self.actor, "actor")?;
        require_unit_amount(self.unit_cost, "unit_cost")
    }

    /// Magnitude of the change.
    pub fn magnitude(&self) -> u32 {
        self.quantity.unsigned_abs() as u32
    }
}

/// One line of a bulk adjustment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkAdjustLine {
    pub item_id: ItemId,
    pub quantity: i64,
    #[serde(default)]
    pub unit_cost: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkAdjustRequest {
    pub lines: Vec<BulkAdjustLine>,
    pub movement_type: MovementType,
    pub reason: String,
    #[serde(default = "default_actor")]
    pub actor: String,
}

impl BulkAdjustRequest {
    pub fn validate(&self) -> Result<()> {
        if self.lines.is_empty() {
            return Err(InventoryError::validation("at least one line is required"));
        }
        Ok(())
    }

    pub fn line_request(&self, line: &BulkAdjustLine) -> AdjustStockRequest {
        AdjustStockRequest {
            quantity: line.quantity,
            movement_type: self.movement_type,
            reason: self.reason.clone(),
            notes: None,
            unit_cost: line.unit_cost,
            actor: self.actor.clone(),
        }
    }
}

/// Move available stock of a product variant between warehouses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    pub product_id: ProductId,
    #[serde(default)]
    pub variant_id: Option<VariantId>,
    pub from_warehouse: WarehouseId,
    pub to_warehouse: WarehouseId,
    pub quantity: u32,
    pub reason: String,
    #[serde(default = "default_actor")]
    pub actor: String,
}

impl TransferRequest {
    pub fn validate(&self) -> Result<()> {
        if self.quantity == 0 {
            return Err(InventoryError::invalid_quantity("transfer quantity must be greater than 0"));
        }
        if self.from_warehouse == self.to_warehouse {
            return Err(InventoryError::validation(
                "source and destination warehouses must differ",
            ));
        }
        require_text(&self.reason, "reason")?;
        require_text(&self.actor, "actor")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityRequest {
    pub product_id: ProductId,
    #[serde(default)]
    pub variant_id: Option<VariantId>,
    pub quantity: u32,
    #[serde(default)]
    pub warehouse_id: Option<WarehouseId>,
}

impl AvailabilityRequest {
    pub fn validate(&self) -> Result<()> {
        if self.quantity == 0 {
            return Err(InventoryError::invalid_quantity("quantity must be greater than 0"));
        }
        Ok(())
    }
}

/// Reserve stock of one product variant for an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReserveRequest {
    pub product_id: ProductId,
    #[serde(default)]
    pub variant_id: Option<VariantId>,
    pub order_id: OrderId,
    pub quantity: u32,
    #[serde(default)]
    pub preferred_warehouse: Option<WarehouseId>,
    /// Hold time in hours; the engine default applies when absent.
    #[serde(default)]
    pub ttl_hours: Option<u32>,
    #[serde(default)]
    pub reserved_price: Money,
    #[serde(default = "default_actor")]
    pub actor: String,
}

impl ReserveRequest {
    pub fn new(product_id: ProductId, order_id: OrderId, quantity: u32) -> Self {
        Self {
            product_id,
            variant_id: None,
            order_id,
            quantity,
            preferred_warehouse: None,
            ttl_hours: None,
            reserved_price: Money::zero(),
            actor: default_actor(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.quantity == 0 {
            return Err(InventoryError::invalid_quantity("quantity must be greater than 0"));
        }
        require_unit_amount(self.reserved_price, "reserved_price")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkReserveLine {
    pub product_id: ProductId,
    #[serde(default)]
    pub variant_id: Option<VariantId>,
    pub quantity: u32,
    #[serde(default)]
    pub reserved_price: Money,
    #[serde(default)]
    pub preferred_warehouse: Option<WarehouseId>,
}

/// Reserve several lines for one order, each line independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkReserveRequest {
    pub order_id: OrderId,
    pub lines: Vec<BulkReserveLine>,
    #[serde(default)]
    pub ttl_hours: Option<u32>,
    #[serde(default = "default_actor")]
    pub actor: String,
}

impl BulkReserveRequest {
    pub fn validate(&self) -> Result<()> {
        if self.lines.is_empty() {
            return Err(InventoryError::validation("at least one line is required"));
        }
        Ok(())
    }

    pub fn line_request(&self, line: &BulkReserveLine) -> ReserveRequest {
        ReserveRequest {
            product_id: line.product_id,
            variant_id: line.variant_id,
            order_id: self.order_id,
            quantity: line.quantity,
            preferred_warehouse: line.preferred_warehouse,
            ttl_hours: self.ttl_hours,
            reserved_price: line.reserved_price,
            actor: self.actor.clone(),
        }
    }
}

/// Result of one line of a best-effort bulk operation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LineOutcome<T> {
    Succeeded { index: usize, result: T },
    Failed { index: usize, code: String, error: String },
}

impl<T> LineOutcome<T> {
    pub fn from_result(index: usize, result: Result<T>) -> Self {
        match result {
            Ok(result) => LineOutcome::Succeeded { index, result },
            Err(e) => LineOutcome::Failed {
                index,
                code: e.code().to_string(),
                error: e.to_string(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, LineOutcome::Succeeded { .. })
    }
}

/// Per-line outcomes of a bulk operation, in request order.
#[derive(Debug, Clone, Serialize)]
pub struct BulkOutcome<T> {
    pub succeeded: usize,
    pub failed: usize,
    pub lines: Vec<LineOutcome<T>>,
}

impl<T> BulkOutcome<T> {
    pub fn from_lines(lines: Vec<LineOutcome<T>>) -> Self {
        let succeeded = lines.iter().filter(|l| l.is_success()).count();
        Self {
            succeeded,
            failed: lines.len() - succeeded,
            lines,
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjust_rejects_zero_and_reservation_types() {
        assert!(matches!(
            AdjustStockRequest::new(0, MovementType::Adjustment, "x").validate(),
            Err(InventoryError::InvalidQuantity(_))
        ));
        assert!(matches!(
            AdjustStockRequest::new(5, MovementType::Reserved, "x").validate(),
            Err(InventoryError::Validation(_))
        ));
        assert!(matches!(
            AdjustStockRequest::new(5, MovementType::Transfer, "x").validate(),
            Err(InventoryError::Validation(_))
        ));
        assert!(AdjustStockRequest::new(5, MovementType::Adjustment, " ").validate().is_err());
        assert!(AdjustStockRequest::new(-5, MovementType::Damaged, "broken").validate().is_ok());
    }

    #[test]
    fn adjust_sign_must_match_movement_type() {
        for movement_type in [MovementType::Inbound, MovementType::Returned] {
            assert!(matches!(
                AdjustStockRequest::new(-3, movement_type, "x").validate(),
                Err(InventoryError::InvalidQuantity(_))
            ));
            assert!(AdjustStockRequest::new(3, movement_type, "x").validate().is_ok());
        }
        for movement_type in [MovementType::Outbound, MovementType::Damaged] {
            assert!(matches!(
                AdjustStockRequest::new(3, movement_type, "x").validate(),
                Err(InventoryError::InvalidQuantity(_))
            ));
            assert!(AdjustStockRequest::new(-3, movement_type, "x").validate().is_ok());
        }
        assert!(AdjustStockRequest::new(3, MovementType::Adjustment, "count").validate().is_ok());
        assert!(AdjustStockRequest::new(-3, MovementType::Adjustment, "count").validate().is_ok());
    }

    #[test]
    fn adjust_rejects_negative_cost() {
        let mut request = AdjustStockRequest::new(1, MovementType::Inbound, "po");
        request.unit_cost = Money::from_cents(-1);
        assert!(request.validate().is_err());
    }

    #[test]
    fn amounts_that_overflow_when_extended_are_rejected() {
        let mut request = AdjustStockRequest::new(3, MovementType::Inbound, "po");
        request.unit_cost = Money::from_cents(i64::MAX / 2);
        assert!(matches!(request.validate(), Err(InventoryError::Validation(_))));

        let mut reserve = ReserveRequest::new(ProductId::new(), OrderId::new(), 2);
        reserve.reserved_price = Money::from_cents(i64::MAX);
        assert!(matches!(reserve.validate(), Err(InventoryError::Validation(_))));
    }

    #[test]
    fn transfer_requires_distinct_warehouses() {
        let w = WarehouseId::new();
        let request = TransferRequest {
            product_id: ProductId::new(),
            variant_id: None,
            from_warehouse: w,
            to_warehouse: w,
            quantity: 1,
            reason: "rebalance".into(),
            actor: "ops".into(),
        };
        assert!(matches!(request.validate(), Err(InventoryError::Validation(_))));
    }

    #[test]
    fn reserve_requires_positive_quantity() {
        let request = ReserveRequest::new(ProductId::new(), OrderId::new(), 0);
        assert!(matches!(request.validate(), Err(InventoryError::InvalidQuantity(_))));
    }

    #[test]
    fn reserve_request_defaults_from_json() {
        let json = serde_json::json!({
            "product_id": ProductId::new(),
            "order_id": OrderId::new(),
            "quantity": 3
        });
        let request: ReserveRequest = serde_json::from_value(json).unwrap();
        assert_eq!(request.actor, "system");
        assert!(request.ttl_hours.is_none());
        assert!(request.reserved_price.is_zero());
    }

    #[test]
    fn bulk_outcome_counts() {
        let outcome = BulkOutcome::from_lines(vec![
            LineOutcome::from_result(0, Ok(1)),
            LineOutcome::from_result(
                1,
                Err(InventoryError::InsufficientStock {
                    requested: 2,
                    available: 1,
                }),
            ),
        ]);
        assert_eq!(outcome.succeeded, 1);
        assert_eq!(outcome.failed, 1);
        assert!(!outcome.all_succeeded());

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["lines"][1]["status"], "failed");
        assert_eq!(json["lines"][1]["code"], "insufficient_stock");
        assert_eq!(json["lines"][0]["result"], 1);
    }
}
