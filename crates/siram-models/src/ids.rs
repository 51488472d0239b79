//! Identifier newtypes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a physical sensor/watering unit.
///
/// Device ids are assigned by the onboarding flow and are compared with
/// case-sensitive equality everywhere.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    /// Wraps an existing id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path of the device's status tree in the realtime store.
    pub fn status_path(&self) -> String {
        format!("users/{}", self.0)
    }

    /// Path of the device's watering status field.
    pub fn watering_status_path(&self) -> String {
        format!("users/{}/watering_status", self.0)
    }

    /// Path of the device's watering method field.
    pub fn watering_method_path(&self) -> String {
        format!("users/{}/watering_method", self.0)
    }

    /// Path of the device's append-only sensor log.
    pub fn readings_path(&self) -> String {
        format!("users/{}/data_kadar_air", self.0)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for DeviceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}
