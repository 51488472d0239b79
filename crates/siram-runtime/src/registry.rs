//! Bookkeeping for live subscriptions.
//!
//! Both types here are locked only for bookkeeping; no lock is held across
//! an `.await`.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use siram_models::DeviceId;
use tokio::task::JoinHandle;

enum Slot {
    /// Registered, subscription not yet open.
    Arming,
    /// Forwarder task running.
    Armed(JoinHandle<()>),
    /// Subscription failed or ended; eligible for re-arming.
    Disarmed,
}

/// Set of devices with a status watch.
///
/// Registration is check-and-insert under one lock, so two concurrent
/// callers can never both arm the same device.
#[derive(Default)]
pub struct WatchRegistry {
    slots: Mutex<HashMap<DeviceId, Slot>>,
}

impl WatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<DeviceId, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claims a device for arming. Returns false if it is already present.
    pub fn try_register(&self, device: &DeviceId) -> bool {
        let mut slots = self.lock();
        if slots.contains_key(device) {
            return false;
        }
        slots.insert(device.clone(), Slot::Arming);
        true
    }

    /// Records the running forwarder for a device.
    pub fn armed(&self, device: &DeviceId, handle: JoinHandle<()>) {
        if let Some(Slot::Armed(old)) = self.lock().insert(device.clone(), Slot::Armed(handle)) {
            old.abort();
        }
    }

    /// Marks a device's subscription as lost. The device stays registered.
    pub fn disarmed(&self, device: &DeviceId) {
        if let Some(slot) = self.lock().get_mut(device) {
            *slot = Slot::Disarmed;
        }
    }

    /// Moves every disarmed or finished device back to arming and returns them.
    pub fn claim_for_rearm(&self) -> Vec<DeviceId> {
        let mut slots = self.lock();
        let mut claimed = Vec::new();
        for (device, slot) in slots.iter_mut() {
            let stale = match slot {
                Slot::Disarmed => true,
                Slot::Armed(handle) => handle.is_finished(),
                Slot::Arming => false,
            };
            if stale {
                *slot = Slot::Arming;
                claimed.push(device.clone());
            }
        }
        claimed.sort();
        claimed
    }

    pub fn contains(&self, device: &DeviceId) -> bool {
        self.lock().contains_key(device)
    }

    /// Devices currently registered, sorted.
    pub fn watched(&self) -> Vec<DeviceId> {
        let mut devices: Vec<_> = self.lock().keys().cloned().collect();
        devices.sort();
        devices
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Stops every forwarder and clears the registry.
    pub fn abort_all(&self) {
        for (_, slot) in self.lock().drain() {
            if let Slot::Armed(handle) = slot {
                handle.abort();
            }
        }
    }
}

/// Holds at most one background listener task.
#[derive(Default)]
pub struct ListenerSlot {
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ListenerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.handle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stops the current listener, if any. Returns true if one was running.
    pub fn dispose(&self) -> bool {
        match self.lock().take() {
            Some(handle) => {
                let running = !handle.is_finished();
                handle.abort();
                running
            }
            None => false,
        }
    }

    /// Installs a new listener, stopping any previous one.
    pub fn install(&self, handle: JoinHandle<()>) {
        if let Some(old) = self.lock().replace(handle) {
            old.abort();
        }
    }

    pub fn is_active(&self) -> bool {
        self.lock().as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for ListenerSlot {
    fn drop(&mut self) {
        self.dispose();
    }
}
