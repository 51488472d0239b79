//! Starts a watch for every newly registered device.

use std::sync::Arc;

use siram_store::{ChangeKind, DocumentStore, USERS_COLLECTION};
use tracing::{debug, info, warn};

use crate::directory::device_id_of;
use crate::error::Result;
use crate::registry::ListenerSlot;
use crate::watcher::WateringWatcher;

/// Follows additions to the user collection.
///
/// At most one collection subscription is live at a time: `start` always
/// disposes the previous one first.
pub struct RegistrationDispatcher {
    docs: Arc<dyn DocumentStore>,
    watcher: WateringWatcher,
    slot: ListenerSlot,
}

impl RegistrationDispatcher {
    pub fn new(docs: Arc<dyn DocumentStore>, watcher: WateringWatcher) -> Self {
        Self {
            docs,
            watcher,
            slot: ListenerSlot::new(),
        }
    }

    /// (Re)subscribes to the user collection.
    pub async fn start(&self) -> Result<()> {
        if self.slot.dispose() {
            debug!("Disposed previous registration listener");
        }

        let mut feed = self.docs.watch(USERS_COLLECTION).await?;
        let watcher = self.watcher.clone();

        let handle = tokio::spawn(async move {
            while let Some(change) = feed.next().await {
                if change.kind != ChangeKind::Added {
                    continue;
                }
                let Some(device) = device_id_of(&change.document) else {
                    continue;
                };
                match watcher.watch(&device).await {
                    Ok(true) => info!(
                        device = %device,
                        user = %change.document.id,
                        "New device registered"
                    ),
                    Ok(false) => {}
                    Err(e) => {
                        warn!(device = %device, error = %e, "Failed to watch registered device")
                    }
                }
            }
            debug!("Registration feed ended");
        });

        self.slot.install(handle);
        Ok(())
    }

    pub fn stop(&self) {
        self.slot.dispose();
    }

    pub fn is_active(&self) -> bool {
        self.slot.is_active()
    }
}
