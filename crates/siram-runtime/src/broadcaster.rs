//! Scheduled status broadcast to every device owner.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use siram_core::StatusCard;
use siram_models::{DeviceId, User};
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::directory::Directory;
use crate::error::Result;
use crate::notifier::{ForecastStyle, Forecaster, StatusNotifier};
use crate::telemetry::Telemetry;

/// Outcome of one broadcast cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastReport {
    pub sent: usize,
    pub failed: usize,
    pub started_at: DateTime<Utc>,
}

/// Sends every device owner a status card with the compact forecast.
pub struct PeriodicBroadcaster {
    directory: Directory,
    telemetry: Telemetry,
    forecaster: Forecaster,
    notifier: StatusNotifier,
    period: Duration,
}

impl PeriodicBroadcaster {
    pub fn new(
        directory: Directory,
        telemetry: Telemetry,
        forecaster: Forecaster,
        notifier: StatusNotifier,
        period: Duration,
    ) -> Self {
        Self {
            directory,
            telemetry,
            forecaster,
            notifier,
            period,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Runs one cycle over all device owners, in directory order.
    ///
    /// A failure for one owner is logged and counted; the rest still run.
    pub async fn run_cycle(&self) -> Result<BroadcastReport> {
        let started_at = Utc::now();
        let owners = self.directory.device_owners().await?;

        let mut report = BroadcastReport {
            sent: 0,
            failed: 0,
            started_at,
        };
        for owner in &owners {
            let Some(device) = owner.device_id.as_ref() else {
                continue;
            };
            match self.broadcast_one(owner, device).await {
                Ok(()) => report.sent += 1,
                Err(e) => {
                    report.failed += 1;
                    error!(owner = %owner.label(), error = %e, "Failed to send scheduled status");
                }
            }
        }

        info!(sent = report.sent, failed = report.failed, "Broadcast cycle finished");
        Ok(report)
    }

    /// Builds and sends the scheduled message for one owner.
    pub async fn broadcast_one(&self, owner: &User, device: &DeviceId) -> Result<()> {
        let snapshot = self.telemetry.snapshot(device).await?;
        let forecast = self.forecaster.block(device, ForecastStyle::Compact).await;
        let message = StatusCard::new(owner, device, &snapshot).periodic(&forecast);
        self.notifier.deliver(owner, &message).await
    }

    /// Runs cycles every period until shutdown. The first cycle starts one
    /// period after the call.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        debug!(period_secs = self.period.as_secs(), "Starting periodic broadcaster");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.run_cycle().await {
                        warn!(error = %e, "Broadcast cycle could not list owners");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        debug!("Broadcaster received shutdown signal");
                        break;
                    }
                }
            }
        }

        debug!("Periodic broadcaster stopped");
    }
}
