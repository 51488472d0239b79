//! Device status tree types.
//!
//! The realtime store holds one tree per device:
//!
//! ```text
//! users/{deviceId}/
//! ├── watering_status   "idle" | "requested" | "in_progress" | "done"
//! ├── watering_method   "manual" | "auto"
//! ├── last_watered      opaque timestamp string
//! └── data_kadar_air/   append-only sensor log
//!     └── {key}: { nilai, status, waktu }
//! ```
//!
//! Values written by devices are not validated, so decoding is lenient:
//! anything unexpected is treated as absent.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// State of the irrigation action for a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WateringStatus {
    /// Nothing requested.
    Idle,
    /// Owner asked for watering, device has not picked it up yet.
    Requested,
    /// Pump is running.
    InProgress,
    /// Watering finished.
    Done,
}

impl WateringStatus {
    /// Stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            WateringStatus::Idle => "idle",
            WateringStatus::Requested => "requested",
            WateringStatus::InProgress => "in_progress",
            WateringStatus::Done => "done",
        }
    }

    /// Returns true for the terminal value that triggers a notification.
    pub fn is_terminal(&self) -> bool {
        matches!(self, WateringStatus::Done)
    }

    /// Decodes a raw store value.
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_str().and_then(|s| s.parse().ok())
    }
}

impl FromStr for WateringStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(WateringStatus::Idle),
            "requested" => Ok(WateringStatus::Requested),
            "in_progress" | "in-progress" => Ok(WateringStatus::InProgress),
            "done" => Ok(WateringStatus::Done),
            other => Err(format!("unknown watering status: {other}")),
        }
    }
}

impl fmt::Display for WateringStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a watering was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WateringMethod {
    /// Requested by the owner.
    Manual,
    /// Started by the device's own moisture threshold.
    Auto,
}

impl WateringMethod {
    /// Stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            WateringMethod::Manual => "manual",
            WateringMethod::Auto => "auto",
        }
    }
}

impl FromStr for WateringMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(WateringMethod::Manual),
            "auto" => Ok(WateringMethod::Auto),
            other => Err(format!("unknown watering method: {other}")),
        }
    }
}

impl fmt::Display for WateringMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level fields of a device status tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceStatus {
    pub watering_status: Option<WateringStatus>,
    pub watering_method: Option<WateringMethod>,
    pub last_watered: Option<String>,
}

impl DeviceStatus {
    /// Decodes the tree at `users/{deviceId}`. A missing tree yields all-absent fields.
    pub fn from_value(value: Option<&Value>) -> Self {
        let Some(tree) = value else {
            return Self::default();
        };

        Self {
            watering_status: tree.get("watering_status").and_then(WateringStatus::from_value),
            watering_method: tree
                .get("watering_method")
                .and_then(Value::as_str)
                .and_then(|s| s.parse().ok()),
            last_watered: tree.get("last_watered").and_then(scalar_text),
        }
    }
}

/// One entry of the sensor log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorReading {
    /// Soil moisture in percent.
    pub moisture: Option<f64>,
    /// Plant health label computed by the device.
    pub health: Option<String>,
    /// When the reading was taken.
    pub taken_at: Option<String>,
}

impl SensorReading {
    /// Decodes one `{ nilai, status, waktu }` log entry.
    pub fn from_value(value: &Value) -> Self {
        let moisture = match value.get("nilai") {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        };

        Self {
            moisture,
            health: value.get("status").and_then(scalar_text),
            taken_at: value.get("waktu").and_then(scalar_text),
        }
    }

    /// Moisture rendered without a trailing `.0` for whole numbers.
    pub fn moisture_text(&self) -> Option<String> {
        self.moisture.map(format_number)
    }
}

/// Status tree plus the most recent sensor reading of one device.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceSnapshot {
    pub status: DeviceStatus,
    pub latest: Option<SensorReading>,
}

/// Formats a number the way it reads in chat: `45`, `45.5`.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
