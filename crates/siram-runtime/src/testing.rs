//! Test doubles shared by the unit tests.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};
use siram_core::{ForecastSource, WeatherError};
use siram_models::DeviceId;
use siram_store::{MemoryRealtimeStore, RealtimeStore, StoreError, Subscription};

use crate::chat::{ChatClient, ChatError};

/// Chat client that records every send and can refuse chosen addresses.
#[derive(Default)]
pub struct RecordingChat {
    sent: Mutex<Vec<(String, String)>>,
    refused: Mutex<HashSet<String>>,
}

impl RecordingChat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refuse(&self, address: &str) {
        self.refused.lock().unwrap().insert(address.to_string());
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|(_, text)| text).collect()
    }

    pub fn sent_to(&self, address: &str) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|(to, _)| to == address)
            .map(|(_, text)| text)
            .collect()
    }
}

#[async_trait]
impl ChatClient for RecordingChat {
    async fn send_text(&self, to: &str, text: &str) -> Result<(), ChatError> {
        if self.refused.lock().unwrap().contains(to) {
            return Err(ChatError::SendFailed {
                to: to.to_string(),
                reason: "refused".to_string(),
            });
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), text.to_string()));
        Ok(())
    }
}

/// Forecast source answering every region with the same body.
pub struct StaticForecasts(pub Option<Value>);

impl StaticForecasts {
    /// One sunny slot in Gubeng.
    pub fn sunny() -> Self {
        let mut table = vec![Value::Null; 21];
        table[0] = json!([1]);
        table[1] = json!({"local_datetime": 2, "t": 3, "weather_desc": 4, "hu": 5});
        table[2] = json!("2025-06-01 10:00:00");
        table[3] = json!(29);
        table[4] = json!("Cerah");
        table[5] = json!(70);
        table[18] = json!("Jawa Timur");
        table[19] = json!("Kota Surabaya");
        table[20] = json!("Gubeng");
        Self(Some(Value::Array(table)))
    }

    pub fn offline() -> Self {
        Self(None)
    }
}

#[async_trait]
impl ForecastSource for StaticForecasts {
    async fn fetch(&self, _region_code: &str) -> Result<Value, WeatherError> {
        self.0
            .clone()
            .ok_or_else(|| WeatherError::RequestFailed("offline".to_string()))
    }
}

/// Realtime store that fails every call under one device's tree.
pub struct BrokenDevice {
    inner: MemoryRealtimeStore,
    prefix: String,
}

impl BrokenDevice {
    pub fn new(device: &DeviceId) -> Self {
        Self {
            inner: MemoryRealtimeStore::new(),
            prefix: device.status_path(),
        }
    }

    fn check(&self, path: &str) -> siram_store::Result<()> {
        let inside = path
            .strip_prefix(&self.prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'));
        if inside {
            return Err(StoreError::Unavailable(format!("read refused: {path}")));
        }
        Ok(())
    }
}

#[async_trait]
impl RealtimeStore for BrokenDevice {
    async fn read(&self, path: &str) -> siram_store::Result<Option<Value>> {
        self.check(path)?;
        self.inner.read(path).await
    }

    async fn read_last(&self, path: &str, n: usize) -> siram_store::Result<Vec<(String, Value)>> {
        self.check(path)?;
        self.inner.read_last(path, n).await
    }

    async fn write(&self, path: &str, value: Value) -> siram_store::Result<()> {
        self.check(path)?;
        self.inner.write(path, value).await
    }

    async fn push(&self, path: &str, value: Value) -> siram_store::Result<String> {
        self.check(path)?;
        self.inner.push(path, value).await
    }

    async fn watch(&self, path: &str) -> siram_store::Result<Subscription<Option<Value>>> {
        self.check(path)?;
        self.inner.watch(path).await
    }
}
