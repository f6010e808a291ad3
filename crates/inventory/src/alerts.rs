//! Alert Generator: scans for low and out-of-stock items and records alerts.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use common::AlertId;
use domain::{
    AlertQuery, AlertType, InventoryError, InventoryItem, ItemFilter, Page, PageRequest, Result,
    StockAlert, StockStatus, derive_status,
};
use serde::{Deserialize, Serialize};

use crate::context::InventoryContext;
use crate::requests::{BulkOutcome, LineOutcome};

/// What a scan does when an item already has an unresolved alert of the same type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertDedupPolicy {
    /// Every scan creates a new alert.
    #[default]
    Cumulative,
    /// Skip items that still have an unresolved alert of that type.
    SkipUnresolved,
}

impl AlertDedupPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertDedupPolicy::Cumulative => "cumulative",
            AlertDedupPolicy::SkipUnresolved => "skip_unresolved",
        }
    }
}

impl FromStr for AlertDedupPolicy {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cumulative" => Ok(AlertDedupPolicy::Cumulative),
            "skip_unresolved" => Ok(AlertDedupPolicy::SkipUnresolved),
            other => Err(InventoryError::validation(format!(
                "unknown alert dedup policy: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertScanReport {
    pub alerts_created: usize,
    pub low_stock_count: usize,
    pub out_of_stock_count: usize,
    /// Items passed over because an unresolved alert already existed.
    pub skipped: usize,
    pub failures: usize,
}

#[derive(Clone)]
pub struct AlertGenerator {
    ctx: InventoryContext,
    policy: AlertDedupPolicy,
    batch_size: usize,
}

impl AlertGenerator {
    pub fn new(ctx: InventoryContext, policy: AlertDedupPolicy, batch_size: usize) -> Self {
        Self {
            ctx,
            policy,
            batch_size: batch_size.max(1),
        }
    }

    pub fn policy(&self) -> AlertDedupPolicy {
        self.policy
    }

    /// Scans items page by page and records one alert per flagged item.
    /// Per-item failures are counted and logged; the scan carries on.
    #[tracing::instrument(skip(self), fields(policy = self.policy.as_str()))]
    pub async fn generate(&self) -> Result<AlertScanReport> {
        let filter = ItemFilter::statuses(vec![
            StockStatus::LowStock,
            StockStatus::OutOfStock,
            StockStatus::Backorder,
        ]);
        let mut report = AlertScanReport::default();
        let mut page = PageRequest::first(self.batch_size);

        loop {
            let batch = self.ctx.items.list(&filter, page).await?;
            for item in &batch.items {
                self.scan_item(item, &mut report).await;
            }
            if batch.len() < page.limit {
                break;
            }
            page = page.next();
        }

        if report.alerts_created > 0 {
            metrics::counter!("inventory_alerts_created_total")
                .increment(report.alerts_created as u64);
        }
        tracing::info!(
            created = report.alerts_created,
            low_stock = report.low_stock_count,
            out_of_stock = report.out_of_stock_count,
            skipped = report.skipped,
            failures = report.failures,
            "alert scan finished"
        );
        Ok(report)
    }

    /// Classifies by quantity, so a backordered item alerts like any other empty one.
    async fn scan_item(&self, item: &InventoryItem, report: &mut AlertScanReport) {
        let status = derive_status(item.quantity_total(), item.reorder_point());
        let Some(alert_type) = AlertType::for_status(status) else {
            return;
        };
        match alert_type {
            AlertType::LowStock => report.low_stock_count += 1,
            AlertType::OutOfStock => report.out_of_stock_count += 1,
        }

        if self.policy == AlertDedupPolicy::SkipUnresolved {
            match self.ctx.alerts.has_unresolved(item.id(), alert_type).await {
                Ok(true) => {
                    report.skipped += 1;
                    return;
                }
                Ok(false) => {}
                Err(e) => {
                    report.failures += 1;
                    tracing::warn!(item_id = %item.id(), error = %e, "failed to check existing alerts");
                    return;
                }
            }
        }

        let alert = StockAlert::for_item(item, alert_type, self.ctx.now());
        match self.ctx.alerts.insert(alert).await {
            Ok(()) => report.alerts_created += 1,
            Err(e) => {
                report.failures += 1;
                tracing::warn!(item_id = %item.id(), error = %e, "failed to create stock alert");
            }
        }
    }

    pub async fn list(&self, query: &AlertQuery) -> Result<Page<StockAlert>> {
        self.ctx.alerts.find(query).await
    }

    pub async fn get(&self, alert_id: AlertId) -> Result<StockAlert> {
        self.ctx
            .alerts
            .get(alert_id)
            .await?
            .ok_or_else(|| InventoryError::AlertNotFound(alert_id.to_string()))
    }

    pub async fn mark_read(&self, alert_id: AlertId) -> Result<StockAlert> {
        let mut alert = self.get(alert_id).await?;
        if alert.mark_read(self.ctx.now()) {
            self.ctx.alerts.update(&alert).await?;
        }
        Ok(alert)
    }

    pub async fn resolve(&self, alert_id: AlertId) -> Result<StockAlert> {
        let mut alert = self.get(alert_id).await?;
        if alert.resolve(self.ctx.now()) {
            self.ctx.alerts.update(&alert).await?;
        }
        Ok(alert)
    }

    pub async fn bulk_mark_read(&self, alert_ids: &[AlertId]) -> BulkOutcome<StockAlert> {
        let mut lines = Vec::with_capacity(alert_ids.len());
        for (index, id) in alert_ids.iter().enumerate() {
            lines.push(LineOutcome::from_result(index, self.mark_read(*id).await));
        }
        BulkOutcome::from_lines(lines)
    }

    pub async fn bulk_resolve(&self, alert_ids: &[AlertId]) -> BulkOutcome<StockAlert> {
        let mut lines = Vec::with_capacity(alert_ids.len());
        for (index, id) in alert_ids.iter().enumerate() {
            lines.push(LineOutcome::from_result(index, self.resolve(*id).await));
        }
        BulkOutcome::from_lines(lines)
    }

    /// Retention purge of resolved alerts.
    #[tracing::instrument(skip(self))]
    pub async fn purge_resolved_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let purged = self.ctx.alerts.delete_resolved_before(cutoff).await?;
        tracing::info!(purged, "resolved alerts purged");
        Ok(purged)
    }
}
