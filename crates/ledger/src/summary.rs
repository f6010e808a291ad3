use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use common::{ItemId, MovementId};
use serde::{Deserialize, Serialize};

use crate::{MovementType, StockMovement};

/// In/out totals for a single calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyMovementStats {
    pub date: NaiveDate,
    pub movements: u64,
    pub inbound: i64,
    pub outbound: i64,
}

/// Aggregate view of the ledger over a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementSummary {
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub total_movements: u64,
    /// Units added to on-hand totals.
    pub total_inbound: i64,
    /// Units removed from on-hand totals (positive number).
    pub total_outbound: i64,
    pub net_change: i64,
    pub by_type: BTreeMap<MovementType, u64>,
    pub daily: Vec<DailyMovementStats>,
}

impl MovementSummary {
    pub fn from_movements(
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
        movements: &[StockMovement],
    ) -> Self {
        let mut by_type = BTreeMap::new();
        let mut daily: BTreeMap<NaiveDate, DailyMovementStats> = BTreeMap::new();
        let mut total_inbound = 0;
        let mut total_outbound = 0;

        for m in movements {
            *by_type.entry(m.movement_type).or_insert(0) += 1;

            let date = m.movement_date.date_naive();
            let day = daily.entry(date).or_insert(DailyMovementStats {
                date,
                movements: 0,
                inbound: 0,
                outbound: 0,
            });
            day.movements += 1;

            let delta = m.delta();
            if delta > 0 {
                total_inbound += delta;
                day.inbound += delta;
            } else {
                total_outbound -= delta;
                day.outbound -= delta;
            }
        }

        Self {
            period_start,
            period_end,
            total_movements: movements.len() as u64,
            total_inbound,
            total_outbound,
            net_change: total_inbound - total_outbound,
            by_type,
            daily: daily.into_values().collect(),
        }
    }
}

/// Movement totals for one inventory item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMovementStats {
    pub item_id: ItemId,
    pub movements: u64,
    pub inbound: i64,
    pub outbound: i64,
}

impl ItemMovementStats {
    /// Units moved in either direction.
    pub fn moved(&self) -> i64 {
        self.inbound + self.outbound
    }

    /// Groups movements by item, busiest first.
    pub fn per_item(movements: &[StockMovement]) -> Vec<ItemMovementStats> {
        let mut stats: HashMap<ItemId, ItemMovementStats> = HashMap::new();
        for m in movements {
            let entry = stats
                .entry(m.inventory_item_id)
                .or_insert(ItemMovementStats {
                    item_id: m.inventory_item_id,
                    movements: 0,
                    inbound: 0,
                    outbound: 0,
                });
            entry.movements += 1;
            let delta = m.delta();
            if delta > 0 {
                entry.inbound += delta;
            } else {
                entry.outbound -= delta;
            }
        }

        let mut stats: Vec<_> = stats.into_values().collect();
        stats.sort_by(|a, b| {
            b.moved()
                .cmp(&a.moved())
                .then(b.movements.cmp(&a.movements))
                .then(a.item_id.cmp(&b.item_id))
        });
        stats
    }
}

/// Result of replaying an item's ledger from zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replay {
    pub item_id: ItemId,
    pub movements: u64,
    /// Total obtained by summing every movement's change.
    pub total: i64,
    /// Movements whose previous total does not follow the one before them.
    pub breaks: Vec<MovementId>,
}

impl Replay {
    pub fn from_movements(item_id: ItemId, movements: &[StockMovement]) -> Self {
        let mut total = 0;
        let mut breaks = Vec::new();

        for m in movements {
            if m.previous_quantity != total {
                breaks.push(m.id);
            }
            total += m.delta();
        }

        Self {
            item_id,
            movements: movements.len() as u64,
            total,
            breaks,
        }
    }

    /// True when every movement continues from the previous one.
    pub fn is_continuous(&self) -> bool {
        self.breaks.is_empty()
    }

    /// Returns true if the replay reproduces `quantity_total`.
    pub fn matches(&self, quantity_total: i64) -> bool {
        self.total == quantity_total
    }
}
