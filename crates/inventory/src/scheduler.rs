//! Periodic maintenance: reservation expiry sweep and alert scan.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

use crate::alerts::AlertGenerator;
use crate::reservations::ReservationManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleSettings {
    pub sweep_interval: Duration,
    pub sweep_batch_size: usize,
    pub alert_interval: Duration,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(60),
            sweep_batch_size: 100,
            alert_interval: Duration::from_secs(900),
        }
    }
}

pub struct MaintenanceScheduler {
    reservations: ReservationManager,
    alerts: AlertGenerator,
    settings: ScheduleSettings,
}

/// Running maintenance tasks. Dropping the handle leaves them running.
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Signals every task to stop and waits for them.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for task in self.tasks {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "maintenance task panicked");
            }
        }
    }
}

impl MaintenanceScheduler {
    pub fn new(
        reservations: ReservationManager,
        alerts: AlertGenerator,
        settings: ScheduleSettings,
    ) -> Self {
        Self {
            reservations,
            alerts,
            settings,
        }
    }

    /// Spawns the expiry sweep and the alert scan on the current runtime.
    pub fn start(self) -> SchedulerHandle {
        let (shutdown, signal) = watch::channel(false);
        let batch_size = self.settings.sweep_batch_size;

        let reservations = self.reservations;
        let sweep = spawn_periodic(
            "expiry_sweep",
            self.settings.sweep_interval,
            signal.clone(),
            move || {
                let reservations = reservations.clone();
                async move { reservations.sweep_expired(batch_size).await.map(|_| ()) }
            },
        );

        let alerts = self.alerts;
        let scan = spawn_periodic(
            "alert_scan",
            self.settings.alert_interval,
            signal,
            move || {
                let alerts = alerts.clone();
                async move { alerts.generate().await.map(|_| ()) }
            },
        );

        tracing::info!(
            sweep_interval_secs = self.settings.sweep_interval.as_secs(),
            alert_interval_secs = self.settings.alert_interval.as_secs(),
            "maintenance scheduler started"
        );
        SchedulerHandle {
            shutdown,
            tasks: vec![sweep, scan],
        }
    }
}

fn spawn_periodic<F, Fut>(
    name: &'static str,
    period: Duration,
    mut signal: watch::Receiver<bool>,
    mut job: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = domain::Result<()>> + Send,
{
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = job().await {
                        tracing::error!(task = name, error = %e, "maintenance tick failed");
                    }
                }
                changed = signal.changed() => {
                    if changed.is_err() || *signal.borrow() {
                        break;
                    }
                }
            }
        }
        tracing::info!(task = name, "maintenance task stopped");
    })
}
