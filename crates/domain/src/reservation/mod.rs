//! Time-bounded holds of stock against orders.

mod state;

pub use state::ReservationState;

use chrono::{DateTime, Duration, Utc};
use common::{ItemId, Money, OrderId, ProductId, ReservationId, VariantId, WarehouseId};
use serde::{Deserialize, Serialize};

use crate::{InventoryError, InventoryItem, Result};

/// How long a reservation holds stock, in whole hours (1 to 168).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct ReservationTtl(u32);

impl ReservationTtl {
    pub const MIN_HOURS: u32 = 1;
    pub const MAX_HOURS: u32 = 168;
    pub const DEFAULT_HOURS: u32 = 24;

    pub fn hours(hours: u32) -> Result<Self> {
        if !(Self::MIN_HOURS..=Self::MAX_HOURS).contains(&hours) {
            return Err(InventoryError::validation(format!(
                "ttl must be between {} and {} hours, got {hours}",
                Self::MIN_HOURS,
                Self::MAX_HOURS
            )));
        }
        Ok(Self(hours))
    }

    /// Clamps into the allowed range instead of failing.
    pub fn clamped(hours: u32) -> Self {
        Self(hours.clamp(Self::MIN_HOURS, Self::MAX_HOURS))
    }

    pub fn as_hours(&self) -> u32 {
        self.0
    }

    pub fn as_duration(&self) -> Duration {
        Duration::hours(self.0 as i64)
    }
}

impl Default for ReservationTtl {
    fn default() -> Self {
        Self(Self::DEFAULT_HOURS)
    }
}

impl TryFrom<u32> for ReservationTtl {
    type Error = InventoryError;

    fn try_from(hours: u32) -> Result<Self> {
        Self::hours(hours)
    }
}

impl From<ReservationTtl> for u32 {
    fn from(ttl: ReservationTtl) -> Self {
        ttl.0
    }
}

/// Stock held at one inventory item for one order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockReservation {
    pub id: ReservationId,
    pub code: String,
    pub inventory_item_id: ItemId,
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub warehouse_id: WarehouseId,
    pub order_id: OrderId,
    pub quantity: u32,
    pub reserved_price: Money,
    pub state: ReservationState,
    pub expires_at: DateTime<Utc>,
    pub released_at: Option<DateTime<Utc>>,
    pub fulfilled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StockReservation {
    pub fn new(
        item: &InventoryItem,
        order_id: OrderId,
        quantity: u32,
        reserved_price: Money,
        ttl: ReservationTtl,
        now: DateTime<Utc>,
    ) -> Self {
        let id = ReservationId::new();
        Self {
            code: Self::code_for(id),
            id,
            inventory_item_id: item.id(),
            product_id: item.product_id(),
            variant_id: item.variant_id(),
            warehouse_id: item.warehouse_id(),
            order_id,
            quantity,
            reserved_price,
            state: ReservationState::Active,
            expires_at: now + ttl.as_duration(),
            released_at: None,
            fulfilled_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Human-facing code derived from the id: `RSV-` plus its first eight hex digits.
    pub fn code_for(id: ReservationId) -> String {
        let simple = id.as_uuid().simple().to_string();
        format!("RSV-{}", simple[..8].to_uppercase())
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Active but past its expiry: must not be consumed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.is_active() && self.expires_at < now
    }

    /// Marks the reservation consumed.
    pub fn fulfill(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.state == ReservationState::Expired || self.is_expired(now) {
            return Err(InventoryError::ReservationExpired(self.id));
        }
        if !self.state.can_fulfill() {
            return Err(InventoryError::ReservationInactive {
                id: self.id,
                state: self.state,
            });
        }
        self.state = ReservationState::Fulfilled;
        self.fulfilled_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Ends the hold. Returns false if the reservation was already inactive.
    pub fn release(&mut self, now: DateTime<Utc>, expired: bool) -> bool {
        if !self.state.can_release() {
            return false;
        }
        self.state = if expired {
            ReservationState::Expired
        } else {
            ReservationState::Released
        };
        self.released_at = Some(now);
        self.updated_at = now;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NewInventoryItem;

    fn item() -> InventoryItem {
        InventoryItem::create(
            NewInventoryItem {
                product_id: ProductId::new(),
                variant_id: Some(VariantId::new()),
                warehouse_id: WarehouseId::new(),
                initial_quantity: 10,
                min_stock_level: 0,
                max_stock_level: 100,
                reorder_point: 2,
                sku: "SKU".into(),
                barcode: None,
                location: None,
                cost_price: Money::zero(),
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn ttl_bounds() {
        assert!(ReservationTtl::hours(0).is_err());
        assert!(ReservationTtl::hours(169).is_err());
        assert_eq!(ReservationTtl::hours(168).unwrap().as_hours(), 168);
        assert_eq!(ReservationTtl::default().as_hours(), 24);
        assert_eq!(ReservationTtl::clamped(500).as_hours(), 168);
        assert_eq!(ReservationTtl::clamped(0).as_hours(), 1);
        assert!(serde_json::from_str::<ReservationTtl>("200").is_err());
    }

    #[test]
    fn new_reservation_copies_item_identity() {
        let item = item();
        let now = Utc::now();
        let r = StockReservation::new(
            &item,
            OrderId::new(),
            3,
            Money::from_cents(999),
            ReservationTtl::hours(2).unwrap(),
            now,
        );

        assert_eq!(r.inventory_item_id, item.id());
        assert_eq!(r.variant_id, item.variant_id());
        assert_eq!(r.expires_at, now + Duration::hours(2));
        assert!(r.is_active());
        assert!(r.code.starts_with("RSV-"));
        assert_eq!(r.code.len(), 12);
    }

    #[test]
    fn fulfill_once() {
        let now = Utc::now();
        let mut r = StockReservation::new(&item(), OrderId::new(), 1, Money::zero(), ReservationTtl::default(), now);

        r.fulfill(now).unwrap();
        assert_eq!(r.state, ReservationState::Fulfilled);
        assert!(matches!(
            r.fulfill(now),
            Err(InventoryError::ReservationInactive { .. })
        ));
        assert!(!r.release(now, false));
    }

    #[test]
    fn expired_reservation_cannot_be_fulfilled() {
        let now = Utc::now();
        let mut r = StockReservation::new(
            &item(),
            OrderId::new(),
            1,
            Money::zero(),
            ReservationTtl::hours(1).unwrap(),
            now,
        );

        let later = now + Duration::hours(2);
        assert!(r.is_expired(later));
        assert!(matches!(
            r.fulfill(later),
            Err(InventoryError::ReservationExpired(_))
        ));
        assert!(r.is_active());
    }

    #[test]
    fn release_is_idempotent() {
        let now = Utc::now();
        let mut r = StockReservation::new(&item(), OrderId::new(), 1, Money::zero(), ReservationTtl::default(), now);

        assert!(r.release(now, true));
        assert_eq!(r.state, ReservationState::Expired);
        assert_eq!(r.released_at, Some(now));
        assert!(!r.release(now, false));
        assert_eq!(r.state, ReservationState::Expired);
        assert!(matches!(
            r.fulfill(now),
            Err(InventoryError::ReservationExpired(_))
        ));
    }
}
