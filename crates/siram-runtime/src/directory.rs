//! Owner lookups in the user collection.

use std::sync::Arc;

use serde_json::{json, Value};
use siram_models::{DeviceId, User};
use siram_store::{Document, DocumentStore, USERS_COLLECTION};
use tracing::{error, warn};

use crate::error::Result;

/// Stored field holding a user's device id.
pub const DEVICE_FIELD: &str = "raspiId";

/// Stored field holding a user's phone number.
pub const PHONE_FIELD: &str = "whatsapp";

/// Returns the device id carried by a user document, if any.
pub fn device_id_of(document: &Document) -> Option<DeviceId> {
    document
        .field(DEVICE_FIELD)
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(DeviceId::from)
}

/// Resolves devices to owners and owners to devices.
///
/// All lookups are "first match wins" with exact equality.
#[derive(Clone)]
pub struct Directory {
    docs: Arc<dyn DocumentStore>,
}

impl Directory {
    pub fn new(docs: Arc<dyn DocumentStore>) -> Self {
        Self { docs }
    }

    /// Finds the owner of a device.
    pub async fn user_for_device(&self, device: &DeviceId) -> Result<Option<User>> {
        self.first_match(DEVICE_FIELD, json!(device.as_str())).await
    }

    /// Finds a user by phone number in stored (local) format.
    pub async fn user_by_phone(&self, phone: &str) -> Result<Option<User>> {
        self.first_match(PHONE_FIELD, json!(phone)).await
    }

    /// Region code of a device's owner.
    ///
    /// Query failures are logged and reported as no region.
    pub async fn region_for_device(&self, device: &DeviceId) -> Option<String> {
        match self.user_for_device(device).await {
            Ok(user) => user.and_then(|u| u.region().map(String::from)),
            Err(e) => {
                error!(device = %device, error = %e, "Failed to look up region code");
                None
            }
        }
    }

    /// All users that own a device, in collection order.
    ///
    /// Undecodable records are skipped with a warning.
    pub async fn device_owners(&self) -> Result<Vec<User>> {
        let documents = self.docs.list(USERS_COLLECTION).await?;
        let owners = documents
            .iter()
            .filter_map(|doc| match User::from_document(&doc.id, &doc.data) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!(id = %doc.id, error = %e, "Skipping unreadable user record");
                    None
                }
            })
            .filter(|user| user.device_id.is_some())
            .collect();
        Ok(owners)
    }

    async fn first_match(&self, field: &str, value: Value) -> Result<Option<User>> {
        let documents = self
            .docs
            .query_eq(USERS_COLLECTION, field, &value, Some(1))
            .await?;

        let user = documents
            .first()
            .map(|doc| User::from_document(&doc.id, &doc.data))
            .transpose()?;
        Ok(user)
    }
}
