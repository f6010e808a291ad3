use chrono::{DateTime, Utc};
use common::ItemId;
use uuid::Uuid;

use crate::{MovementType, StockMovement};

/// Builder for filtering ledger movements.
///
/// Every filter is optional; an empty query matches the whole ledger in
/// recording order.
#[derive(Debug, Clone, Default)]
pub struct MovementQuery {
    /// Filter by inventory item.
    pub item_id: Option<ItemId>,

    /// Filter by movement types (any of these).
    pub movement_types: Option<Vec<MovementType>>,

    /// Filter by reference type.
    pub reference_type: Option<String>,

    /// Filter by reference id.
    pub reference_id: Option<Uuid>,

    /// Movements on or after this date.
    pub from_date: Option<DateTime<Utc>>,

    /// Movements on or before this date.
    pub to_date: Option<DateTime<Utc>>,

    pub limit: Option<usize>,
    pub offset: Option<usize>,

    /// Return the most recent movements first.
    pub newest_first: bool,
}

impl MovementQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query for a single item.
    pub fn for_item(item_id: ItemId) -> Self {
        Self {
            item_id: Some(item_id),
            ..Default::default()
        }
    }

    /// Creates a query for everything attached to a reference.
    pub fn for_reference(reference_type: impl Into<String>, reference_id: Uuid) -> Self {
        Self {
            reference_type: Some(reference_type.into()),
            reference_id: Some(reference_id),
            ..Default::default()
        }
    }

    pub fn item(mut self, item_id: ItemId) -> Self {
        self.item_id = Some(item_id);
        self
    }

    pub fn movement_type(mut self, movement_type: MovementType) -> Self {
        self.movement_types = Some(vec![movement_type]);
        self
    }

    pub fn movement_types(mut self, movement_types: Vec<MovementType>) -> Self {
        self.movement_types = Some(movement_types);
        self
    }

    pub fn reference_type(mut self, reference_type: impl Into<String>) -> Self {
        self.reference_type = Some(reference_type.into());
        self
    }

    pub fn from_date(mut self, date: DateTime<Utc>) -> Self {
        self.from_date = Some(date);
        self
    }

    pub fn to_date(mut self, date: DateTime<Utc>) -> Self {
        self.to_date = Some(date);
        self
    }

    /// Restricts to an inclusive date range.
    pub fn between(self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.from_date(from).to_date(to)
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn newest_first(mut self) -> Self {
        self.newest_first = true;
        self
    }

    /// Returns true if a movement passes every filter (paging excluded).
    pub fn matches(&self, movement: &StockMovement) -> bool {
        if let Some(id) = self.item_id
            && movement.inventory_item_id != id
        {
            return false;
        }
        if let Some(ref types) = self.movement_types
            && !types.contains(&movement.movement_type)
        {
            return false;
        }
        if let Some(ref reference_type) = self.reference_type
            && movement.reference_type.as_ref() != Some(reference_type)
        {
            return false;
        }
        if let Some(reference_id) = self.reference_id
            && movement.reference_id != Some(reference_id)
        {
            return false;
        }
        if let Some(from) = self.from_date
            && movement.movement_date < from
        {
            return false;
        }
        if let Some(to) = self.to_date
            && movement.movement_date > to
        {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn movement(item_id: ItemId, movement_type: MovementType) -> StockMovement {
        StockMovement::builder(item_id, movement_type)
            .quantity(1)
            .totals(0, 1)
            .build()
    }

    #[test]
    fn empty_query_matches_everything() {
        let m = movement(ItemId::new(), MovementType::Inbound);
        assert!(MovementQuery::new().matches(&m));
    }

    #[test]
    fn item_and_type_filters() {
        let item = ItemId::new();
        let m = movement(item, MovementType::Inbound);

        assert!(MovementQuery::for_item(item).matches(&m));
        assert!(!MovementQuery::for_item(ItemId::new()).matches(&m));
        assert!(
            MovementQuery::for_item(item)
                .movement_types(vec![MovementType::Outbound, MovementType::Inbound])
                .matches(&m)
        );
        assert!(
            !MovementQuery::new()
                .movement_type(MovementType::Damaged)
                .matches(&m)
        );
    }

    #[test]
    fn reference_filter() {
        let order = Uuid::new_v4();
        let m = StockMovement::builder(ItemId::new(), MovementType::Outbound)
            .quantity(-1)
            .totals(1, 0)
            .reference("order", order)
            .build();

        assert!(MovementQuery::for_reference("order", order).matches(&m));
        assert!(!MovementQuery::for_reference("order", Uuid::new_v4()).matches(&m));
        assert!(!MovementQuery::new().reference_type("transfer").matches(&m));
    }

    #[test]
    fn date_range_is_inclusive() {
        let m = movement(ItemId::new(), MovementType::Inbound);
        let at = m.movement_date;

        assert!(MovementQuery::new().between(at, at).matches(&m));
        assert!(
            !MovementQuery::new()
                .from_date(at + Duration::seconds(1))
                .matches(&m)
        );
        assert!(
            !MovementQuery::new()
                .to_date(at - Duration::seconds(1))
                .matches(&m)
        );
    }
}
