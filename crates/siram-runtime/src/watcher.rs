//! Watering-completion watcher.
//!
//! Each watched device gets one forwarder task that turns its status
//! subscription into [`StatusEvent`]s on a shared channel. A single
//! [`WatchReactor`] consumes that channel, keeps the last status seen per
//! device, and fires the [`CompletionHandler`] on every transition into
//! `done`.
//!
//! A subscription's first delivery is the value at subscription time. It
//! is a baseline: it never fires on a device seen for the first time, and
//! after a re-arm it fires only if the device finished while unwatched.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use siram_models::{DeviceId, WateringStatus};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::registry::WatchRegistry;
use crate::telemetry::Telemetry;

/// Reacts to a finished watering run.
#[async_trait]
pub trait CompletionHandler: Send + Sync {
    async fn on_completed(&self, device: &DeviceId);
}

/// Watch state of one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Unwatched,
    Watching,
}

/// One delivery from a device's status subscription.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusEvent {
    pub device: DeviceId,
    pub status: Option<WateringStatus>,
    /// First delivery of its subscription.
    pub initial: bool,
}

/// Decides whether a delivery is a transition into `done`.
///
/// `previous` is `None` when the device has never been seen, and
/// `Some(status)` with the last status delivered otherwise.
pub fn is_completion_edge(
    previous: Option<Option<WateringStatus>>,
    current: Option<WateringStatus>,
    initial: bool,
) -> bool {
    if !current.is_some_and(|status| status.is_terminal()) {
        return false;
    }
    match previous {
        None => !initial,
        Some(previous) => !previous.is_some_and(|status| status.is_terminal()),
    }
}

struct Inner {
    telemetry: Telemetry,
    registry: WatchRegistry,
    events: mpsc::UnboundedSender<StatusEvent>,
}

/// Owns the per-device status subscriptions.
#[derive(Clone)]
pub struct WateringWatcher {
    inner: Arc<Inner>,
}

impl WateringWatcher {
    /// Creates a watcher and the reactor that consumes its events.
    pub fn new(telemetry: Telemetry) -> (Self, WatchReactor) {
        let (events, rx) = mpsc::unbounded_channel();
        let watcher = Self {
            inner: Arc::new(Inner {
                telemetry,
                registry: WatchRegistry::new(),
                events,
            }),
        };
        (watcher, WatchReactor::new(rx))
    }

    /// Starts watching a device.
    ///
    /// Returns `Ok(false)` if the device is already watched. If the
    /// subscription cannot be opened the device stays registered but
    /// disarmed, and the error is returned.
    pub async fn watch(&self, device: &DeviceId) -> Result<bool> {
        if !self.inner.registry.try_register(device) {
            debug!(device = %device, "Device already watched");
            return Ok(false);
        }

        match self.arm(device).await {
            Ok(()) => {
                info!(device = %device, "Watching watering status");
                Ok(true)
            }
            Err(e) => {
                self.inner.registry.disarmed(device);
                Err(e)
            }
        }
    }

    /// Re-subscribes every watch whose subscription failed or ended.
    ///
    /// Returns the number of watches re-armed.
    pub async fn rearm(&self) -> usize {
        let mut rearmed = 0;
        for device in self.inner.registry.claim_for_rearm() {
            match self.arm(&device).await {
                Ok(()) => rearmed += 1,
                Err(e) => {
                    warn!(device = %device, error = %e, "Failed to re-arm watch");
                    self.inner.registry.disarmed(&device);
                }
            }
        }
        if rearmed > 0 {
            info!(count = rearmed, "Re-armed watering watches");
        }
        rearmed
    }

    pub fn state(&self, device: &DeviceId) -> WatchState {
        if self.inner.registry.contains(device) {
            WatchState::Watching
        } else {
            WatchState::Unwatched
        }
    }

    /// Devices being watched, sorted.
    pub fn watched(&self) -> Vec<DeviceId> {
        self.inner.registry.watched()
    }

    /// Stops every forwarder.
    pub fn shutdown(&self) {
        self.inner.registry.abort_all();
    }

    async fn arm(&self, device: &DeviceId) -> Result<()> {
        let mut subscription = self.inner.telemetry.watch_status(device).await?;
        let events = self.inner.events.clone();
        let forwarded = device.clone();

        let handle = tokio::spawn(async move {
            let mut initial = true;
            while let Some(value) = subscription.next().await {
                let status = value.as_ref().and_then(WateringStatus::from_value);
                let event = StatusEvent {
                    device: forwarded.clone(),
                    status,
                    initial,
                };
                if events.send(event).is_err() {
                    break;
                }
                initial = false;
            }
            debug!(device = %forwarded, "Status subscription ended");
        });

        self.inner.registry.armed(device, handle);
        Ok(())
    }
}

/// Consumes status events and detects completions.
pub struct WatchReactor {
    events: mpsc::UnboundedReceiver<StatusEvent>,
    last_seen: HashMap<DeviceId, Option<WateringStatus>>,
}

impl WatchReactor {
    fn new(events: mpsc::UnboundedReceiver<StatusEvent>) -> Self {
        Self {
            events,
            last_seen: HashMap::new(),
        }
    }

    /// Records an event. Returns true if it is a completion edge.
    pub fn observe(&mut self, event: &StatusEvent) -> bool {
        let previous = self.last_seen.insert(event.device.clone(), event.status);
        is_completion_edge(previous, event.status, event.initial)
    }

    /// Runs until every watcher handle is gone.
    ///
    /// Each completion is handled on its own task so a slow device never
    /// delays another.
    pub async fn run(mut self, handler: Arc<dyn CompletionHandler>) {
        while let Some(event) = self.events.recv().await {
            if !self.observe(&event) {
                continue;
            }
            info!(device = %event.device, "Watering finished");
            let handler = handler.clone();
            tokio::spawn(async move {
                handler.on_completed(&event.device).await;
            });
        }
        debug!("Watch reactor stopped");
    }
}
