//! Reservation Manager: holds stock against orders until it is fulfilled,
//! released or expires.
//!
//! A reservation request may be split across warehouses. Each line is taken
//! under its item's lock; if any line fails, the lines already taken are
//! released in reverse order so the request has no partial effect.

use common::{OrderId, ReservationId};
use domain::{InventoryError, ReservationTtl, Result, StockReservation};
use ledger::{MovementType, StockMovement, reference};
use serde::{Deserialize, Serialize};

use crate::allocation::{AllocationLine, AllocationPlanner, Availability};
use crate::context::InventoryContext;
use crate::requests::{BulkOutcome, BulkReserveRequest, LineOutcome, ReserveRequest};
use crate::services::AllocationNotice;

/// Counts from one expiry sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub scanned: usize,
    pub expired: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct ReservationManager {
    ctx: InventoryContext,
    planner: AllocationPlanner,
    default_ttl: ReservationTtl,
}

impl ReservationManager {
    pub fn new(ctx: InventoryContext, planner: AllocationPlanner, default_ttl: ReservationTtl) -> Self {
        Self {
            ctx,
            planner,
            default_ttl,
        }
    }

    /// Reserves the requested quantity, in the preferred warehouse when it
    /// can cover all of it, otherwise across warehouses by priority.
    ///
    /// Returns one reservation per warehouse used.
    #[tracing::instrument(skip(self, request), fields(order_id = %request.order_id, product_id = %request.product_id, quantity = request.quantity))]
    pub async fn reserve(&self, request: ReserveRequest) -> Result<Vec<StockReservation>> {
        let start = std::time::Instant::now();
        let result = self.try_reserve(&request).await;
        metrics::histogram!("inventory_reserve_duration_seconds")
            .record(start.elapsed().as_secs_f64());

        match result {
            Ok(reservations) => {
                metrics::counter!("inventory_reservations_total").increment(1);
                self.notify_allocation(request.order_id, &reservations).await;
                tracing::info!(lines = reservations.len(), "stock reserved");
                Ok(reservations)
            }
            Err(e) => {
                metrics::counter!("inventory_reservations_failed_total").increment(1);
                tracing::warn!(error = %e, "reservation failed");
                Err(e)
            }
        }
    }

    async fn try_reserve(&self, request: &ReserveRequest) -> Result<Vec<StockReservation>> {
        request.validate()?;
        let ttl = match request.ttl_hours {
            Some(hours) => ReservationTtl::hours(hours)?,
            None => self.default_ttl,
        };

        let plan = self.plan(request).await?;
        if !plan.is_available {
            return Err(InventoryError::InsufficientStock {
                requested: request.quantity as u64,
                available: plan.total_available,
            });
        }

        let mut taken: Vec<StockReservation> = Vec::with_capacity(plan.allocation_suggestion.len());
        for line in &plan.allocation_suggestion {
            match self.reserve_line(line, request, ttl).await {
                Ok(reservation) => taken.push(reservation),
                Err(e) => {
                    self.compensate(&taken, &request.actor).await;
                    return Err(e);
                }
            }
        }
        Ok(taken)
    }

    async fn plan(&self, request: &ReserveRequest) -> Result<Availability> {
        if let Some(preferred) = request.preferred_warehouse {
            let plan = self
                .planner
                .suggest(request.product_id, request.variant_id, request.quantity, Some(preferred))
                .await?;
            if plan.is_available {
                return Ok(plan);
            }
            tracing::debug!(warehouse_id = %preferred, "preferred warehouse cannot cover request");
        }
        self.planner
            .suggest(request.product_id, request.variant_id, request.quantity, None)
            .await
    }

    /// Takes one allocation line under the item's lock.
    async fn reserve_line(
        &self,
        line: &AllocationLine,
        request: &ReserveRequest,
        ttl: ReservationTtl,
    ) -> Result<StockReservation> {
        let _guard = self.ctx.locks.lock(line.item_id).await;
        let mut loaded = self.ctx.load_for_update(line.item_id).await?;
        let now = self.ctx.now();

        loaded.item.reserve(line.quantity, now)?;
        let reservation = StockReservation::new(
            &loaded.item,
            request.order_id,
            line.quantity,
            request.reserved_price,
            ttl,
            now,
        );

        self.ctx.save(&loaded).await?;
        if let Err(e) = self.ctx.reservations.insert(reservation.clone()).await {
            self.ctx.restore(&loaded).await;
            return Err(e);
        }

        let movement = self
            .movement(&reservation, MovementType::Reserved, line.quantity as i64, loaded.total())
            .reason(format!("reservation {}", reservation.code))
            .actor(request.actor.clone())
            .movement_date(now)
            .build();
        if let Err(e) = self.ctx.record(movement).await {
            self.ctx.restore(&loaded).await;
            let mut abandoned = reservation.clone();
            abandoned.release(now, false);
            if let Err(update_err) = self.ctx.reservations.update(&abandoned).await {
                tracing::error!(reservation_id = %reservation.id, error = %update_err, "failed to close abandoned reservation");
            }
            return Err(e);
        }

        Ok(reservation)
    }

    /// Releases lines taken earlier in a failed request, newest first.
    async fn compensate(&self, taken: &[StockReservation], actor: &str) {
        for reservation in taken.iter().rev() {
            if let Err(e) = self.release_inner(reservation.id, false, actor).await {
                tracing::error!(reservation_id = %reservation.id, error = %e, "compensating release failed");
            }
        }
    }

    /// Releases a reservation. Returns false when it was already inactive.
    #[tracing::instrument(skip(self))]
    pub async fn release(&self, reservation_id: ReservationId, actor: &str) -> Result<bool> {
        let released = self.release_inner(reservation_id, false, actor).await?;
        if released {
            metrics::counter!("inventory_reservations_released_total").increment(1);
        }
        Ok(released)
    }

    async fn release_inner(&self, reservation_id: ReservationId, expired: bool, actor: &str) -> Result<bool> {
        let reservation = self.find(reservation_id).await?;
        if !reservation.is_active() {
            return Ok(false);
        }

        let _guard = self.ctx.locks.lock(reservation.inventory_item_id).await;
        // Re-read under the lock: a concurrent release or fulfil may have won.
        let original = self.find(reservation_id).await?;
        let mut reservation = original.clone();
        let now = self.ctx.now();
        if !reservation.release(now, expired) {
            return Ok(false);
        }

        let mut loaded = self.ctx.load_for_update(reservation.inventory_item_id).await?;
        loaded.item.release(reservation.quantity, now)?;
        self.ctx.save(&loaded).await?;
        if let Err(e) = self.ctx.reservations.update(&reservation).await {
            self.ctx.restore(&loaded).await;
            return Err(e);
        }

        let reason = if expired { "reservation expired" } else { "reservation released" };
        let movement = self
            .movement(&reservation, MovementType::Released, -(reservation.quantity as i64), loaded.total())
            .reason(reason)
            .actor(actor)
            .movement_date(now)
            .build();
        if let Err(e) = self.ctx.record(movement).await {
            self.ctx.restore(&loaded).await;
            self.revert(&original).await;
            return Err(e);
        }

        tracing::info!(%reservation_id, expired, "reservation released");
        Ok(true)
    }

    /// Consumes a reservation: its stock leaves the warehouse.
    #[tracing::instrument(skip(self))]
    pub async fn fulfill(&self, reservation_id: ReservationId, actor: &str) -> Result<StockReservation> {
        let reservation = self.find(reservation_id).await?;

        let _guard = self.ctx.locks.lock(reservation.inventory_item_id).await;
        let original = self.find(reservation_id).await?;
        let mut reservation = original.clone();
        let now = self.ctx.now();
        reservation.fulfill(now)?;

        let mut loaded = self.ctx.load_for_update(reservation.inventory_item_id).await?;
        loaded.item.fulfill(reservation.quantity, now)?;
        self.ctx.save(&loaded).await?;
        if let Err(e) = self.ctx.reservations.update(&reservation).await {
            self.ctx.restore(&loaded).await;
            return Err(e);
        }

        let movement = StockMovement::builder(reservation.inventory_item_id, MovementType::Outbound)
            .quantity(-(reservation.quantity as i64))
            .totals(loaded.original_total(), loaded.total())
            .reference(reference::ORDER, reservation.order_id.as_uuid())
            .reason(format!("fulfilled reservation {}", reservation.code))
            .unit_cost(loaded.item.cost_price())
            .actor(actor)
            .movement_date(now)
            .build();
        if let Err(e) = self.ctx.record(movement).await {
            self.ctx.restore(&loaded).await;
            self.revert(&original).await;
            return Err(e);
        }

        metrics::counter!("inventory_reservations_fulfilled_total").increment(1);
        tracing::info!(%reservation_id, quantity = reservation.quantity, "reservation fulfilled");

        let details = format!("reservation {} fulfilled ({} units)", reservation.code, reservation.quantity);
        if let Err(e) = self
            .ctx
            .orders
            .update_stock_status(reservation.order_id, "fulfilled", &details)
            .await
        {
            tracing::warn!(order_id = %reservation.order_id, error = %e, "failed to update order stock status");
        }
        Ok(reservation)
    }

    /// Releases every active reservation of an order. Returns how many were released.
    #[tracing::instrument(skip(self))]
    pub async fn release_order(&self, order_id: OrderId, actor: &str) -> Result<usize> {
        let mut released = 0;
        for reservation in self.ctx.reservations.find_by_order(order_id).await? {
            if reservation.is_active() && self.release(reservation.id, actor).await? {
                released += 1;
            }
        }
        Ok(released)
    }

    /// Fulfils every active reservation of an order.
    #[tracing::instrument(skip(self))]
    pub async fn fulfill_order(&self, order_id: OrderId, actor: &str) -> Result<Vec<StockReservation>> {
        let mut fulfilled = Vec::new();
        for reservation in self.ctx.reservations.find_by_order(order_id).await? {
            if reservation.is_active() {
                fulfilled.push(self.fulfill(reservation.id, actor).await?);
            }
        }
        Ok(fulfilled)
    }

    pub async fn get(&self, reservation_id: ReservationId) -> Result<StockReservation> {
        self.find(reservation_id).await
    }

    pub async fn get_by_code(&self, code: &str) -> Result<StockReservation> {
        self.ctx
            .reservations
            .get_by_code(code)
            .await?
            .ok_or_else(|| InventoryError::ReservationNotFound(code.to_string()))
    }

    pub async fn for_order(&self, order_id: OrderId) -> Result<Vec<StockReservation>> {
        self.ctx.reservations.find_by_order(order_id).await
    }

    /// Reserves each line on its own; failed lines are reported, not fatal.
    #[tracing::instrument(skip(self, request), fields(order_id = %request.order_id, lines = request.lines.len()))]
    pub async fn bulk_reserve(
        &self,
        request: BulkReserveRequest,
    ) -> Result<BulkOutcome<Vec<StockReservation>>> {
        request.validate()?;

        let mut lines = Vec::with_capacity(request.lines.len());
        for (index, line) in request.lines.iter().enumerate() {
            let result = self.reserve(request.line_request(line)).await;
            lines.push(LineOutcome::from_result(index, result));
        }
        Ok(BulkOutcome::from_lines(lines))
    }

    /// Expires active reservations past their deadline, at most `batch_size`
    /// per call. A reservation that fails is logged and skipped.
    #[tracing::instrument(skip(self))]
    pub async fn sweep_expired(&self, batch_size: usize) -> Result<SweepReport> {
        let due = self
            .ctx
            .reservations
            .find_expired(self.ctx.now(), batch_size)
            .await?;

        let mut report = SweepReport {
            scanned: due.len(),
            ..SweepReport::default()
        };
        for reservation in due {
            match self.release_inner(reservation.id, true, "system").await {
                Ok(true) => report.expired += 1,
                Ok(false) => {}
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(reservation_id = %reservation.id, error = %e, "failed to expire reservation");
                }
            }
        }

        if report.expired > 0 {
            metrics::counter!("inventory_reservations_expired_total").increment(report.expired as u64);
        }
        tracing::info!(scanned = report.scanned, expired = report.expired, failed = report.failed, "expiry sweep finished");
        Ok(report)
    }

    async fn find(&self, reservation_id: ReservationId) -> Result<StockReservation> {
        self.ctx
            .reservations
            .get(reservation_id)
            .await?
            .ok_or_else(|| InventoryError::reservation_not_found(reservation_id))
    }

    async fn revert(&self, original: &StockReservation) {
        if let Err(e) = self.ctx.reservations.update(original).await {
            tracing::error!(reservation_id = %original.id, error = %e, "failed to revert reservation");
        }
    }

    fn movement(
        &self,
        reservation: &StockReservation,
        movement_type: MovementType,
        quantity: i64,
        total: i64,
    ) -> ledger::MovementBuilder {
        StockMovement::builder(reservation.inventory_item_id, movement_type)
            .quantity(quantity)
            .totals(total, total)
            .reference(reference::ORDER, reservation.order_id.as_uuid())
            .notes(reservation.code.clone())
    }

    async fn notify_allocation(&self, order_id: OrderId, reservations: &[StockReservation]) {
        let notices: Vec<AllocationNotice> = reservations
            .iter()
            .map(|r| AllocationNotice {
                reservation_id: r.id,
                item_id: r.inventory_item_id,
                warehouse_id: r.warehouse_id,
                quantity: r.quantity,
            })
            .collect();
        if let Err(e) = self.ctx.orders.notify_allocation(order_id, &notices).await {
            tracing::warn!(%order_id, error = %e, "failed to notify order system of allocation");
        }
    }
}
