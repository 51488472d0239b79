//! Reads and writes on a device's realtime status tree.

use std::sync::Arc;

use serde_json::{json, Value};
use siram_models::{
    DeviceId, DeviceSnapshot, DeviceStatus, SensorReading, WateringMethod, WateringStatus,
};
use siram_store::{RealtimeStore, Subscription};
use tracing::info;

use crate::error::Result;

#[derive(Clone)]
pub struct Telemetry {
    realtime: Arc<dyn RealtimeStore>,
}

impl Telemetry {
    pub fn new(realtime: Arc<dyn RealtimeStore>) -> Self {
        Self { realtime }
    }

    /// Status tree plus the newest sensor reading.
    ///
    /// "Newest" is the last child of the sensor log in key order.
    pub async fn snapshot(&self, device: &DeviceId) -> Result<DeviceSnapshot> {
        let tree = self.realtime.read(&device.status_path()).await?;
        let latest = self
            .realtime
            .read_last(&device.readings_path(), 1)
            .await?
            .into_iter()
            .next()
            .map(|(_, value)| SensorReading::from_value(&value));

        Ok(DeviceSnapshot {
            status: DeviceStatus::from_value(tree.as_ref()),
            latest,
        })
    }

    /// Asks the device to water now.
    pub async fn request_watering(&self, device: &DeviceId) -> Result<()> {
        self.realtime
            .write(
                &device.watering_status_path(),
                json!(WateringStatus::Requested.as_str()),
            )
            .await?;
        self.realtime
            .write(
                &device.watering_method_path(),
                json!(WateringMethod::Manual.as_str()),
            )
            .await?;
        info!(device = %device, "Manual watering requested");
        Ok(())
    }

    /// Subscribes to the device's watering status field.
    pub async fn watch_status(&self, device: &DeviceId) -> Result<Subscription<Option<Value>>> {
        Ok(self.realtime.watch(&device.watering_status_path()).await?)
    }
}
