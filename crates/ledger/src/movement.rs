use std::str::FromStr;

use chrono::{DateTime, Utc};
use common::{ItemId, Money, MovementId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::LedgerError;

/// Well-known reference types carried by movements.
pub mod reference {
    pub const ORDER: &str = "order";
    pub const PURCHASE_ORDER: &str = "purchase_order";
    pub const TRANSFER: &str = "transfer";
    pub const ADJUSTMENT: &str = "adjustment";
    pub const RECONCILIATION: &str = "reconciliation";
    pub const RESERVATION: &str = "reservation";
    pub const INITIAL_STOCK: &str = "initial_stock";
}

/// Kind of quantity change a movement records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    Inbound,
    Outbound,
    Adjustment,
    Reserved,
    Released,
    Transfer,
    Damaged,
    Returned,
}

impl MovementType {
    pub const ALL: [MovementType; 8] = [
        MovementType::Inbound,
        MovementType::Outbound,
        MovementType::Adjustment,
        MovementType::Reserved,
        MovementType::Released,
        MovementType::Transfer,
        MovementType::Damaged,
        MovementType::Returned,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Inbound => "inbound",
            MovementType::Outbound => "outbound",
            MovementType::Adjustment => "adjustment",
            MovementType::Reserved => "reserved",
            MovementType::Released => "released",
            MovementType::Transfer => "transfer",
            MovementType::Damaged => "damaged",
            MovementType::Returned => "returned",
        }
    }

    /// Reservation movements shift stock between available and reserved
    /// without changing the on-hand total.
    pub fn is_reservation(&self) -> bool {
        matches!(self, MovementType::Reserved | MovementType::Released)
    }

    /// Types a caller may use for a manual stock adjustment.
    pub fn is_manual_adjustment(&self) -> bool {
        matches!(
            self,
            MovementType::Inbound
                | MovementType::Outbound
                | MovementType::Adjustment
                | MovementType::Damaged
                | MovementType::Returned
        )
    }
}

impl std::fmt::Display for MovementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MovementType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| LedgerError::UnknownMovementType(s.to_string()))
    }
}

/// An immutable record of one quantity change on an inventory item.
///
/// `previous_quantity` and `new_quantity` always describe the item's total
/// on-hand quantity. Reservation movements carry the reserved amount in
/// `quantity` and leave the total unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: MovementId,
    pub inventory_item_id: ItemId,
    pub movement_type: MovementType,
    pub quantity: i64,
    pub previous_quantity: i64,
    pub new_quantity: i64,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    pub reason: String,
    pub notes: Option<String>,
    pub unit_cost: Money,
    pub total_cost: Money,
    pub actor: String,
    pub movement_date: DateTime<Utc>,
}

impl StockMovement {
    /// Creates a new movement builder.
    pub fn builder(inventory_item_id: ItemId, movement_type: MovementType) -> MovementBuilder {
        MovementBuilder::new(inventory_item_id, movement_type)
    }

    /// Change to the on-hand total this movement represents.
    pub fn delta(&self) -> i64 {
        self.new_quantity - self.previous_quantity
    }

    pub fn is_inbound(&self) -> bool {
        self.delta() > 0
    }

    pub fn is_outbound(&self) -> bool {
        self.delta() < 0
    }
}

/// Builder for constructing stock movements.
#[derive(Debug)]
pub struct MovementBuilder {
    inventory_item_id: ItemId,
    movement_type: MovementType,
    quantity: i64,
    previous_quantity: i64,
    new_quantity: i64,
    reference_type: Option<String>,
    reference_id: Option<Uuid>,
    reason: String,
    notes: Option<String>,
    unit_cost: Money,
    actor: String,
    movement_date: Option<DateTime<Utc>>,
}

impl MovementBuilder {
    fn new(inventory_item_id: ItemId, movement_type: MovementType) -> Self {
        Self {
            inventory_item_id,
            movement_type,
            quantity: 0,
            previous_quantity: 0,
            new_quantity: 0,
            reference_type: None,
            reference_id: None,
            reason: String::new(),
            notes: None,
            unit_cost: Money::zero(),
            actor: "system".to_string(),
            movement_date: None,
        }
    }

    pub fn quantity(mut self, quantity: i64) -> Self {
        self.quantity = quantity;
        self
    }

    /// Sets the total before and after the change.
    pub fn totals(mut self, previous: i64, new: i64) -> Self {
        self.previous_quantity = previous;
        self.new_quantity = new;
        self
    }

    pub fn reference(mut self, reference_type: impl Into<String>, reference_id: Uuid) -> Self {
        self.reference_type = Some(reference_type.into());
        self.reference_id = Some(reference_id);
        self
    }

    /// Sets a reference type without an identifier (e.g. `initial_stock`).
    pub fn reference_type(mut self, reference_type: impl Into<String>) -> Self {
        self.reference_type = Some(reference_type.into());
        self
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn unit_cost(mut self, unit_cost: Money) -> Self {
        self.unit_cost = unit_cost;
        self
    }

    pub fn actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = actor.into();
        self
    }

    pub fn movement_date(mut self, date: DateTime<Utc>) -> Self {
        self.movement_date = Some(date);
        self
    }

    pub fn build(self) -> StockMovement {
        StockMovement {
            id: MovementId::new(),
            inventory_item_id: self.inventory_item_id,
            movement_type: self.movement_type,
            quantity: self.quantity,
            previous_quantity: self.previous_quantity,
            new_quantity: self.new_quantity,
            reference_type: self.reference_type,
            reference_id: self.reference_id,
            reason: self.reason,
            notes: self.notes,
            unit_cost: self.unit_cost,
            total_cost: self.unit_cost.extend(self.quantity),
            actor: self.actor,
            movement_date: self.movement_date.unwrap_or_else(Utc::now),
        }
    }
}
