//! Message delivery and the completion notification.

use std::sync::Arc;

use async_trait::async_trait;
use siram_core::{region_not_found_block, to_chat_address, StatusCard, WeatherFetcher};
use siram_models::{DeviceId, User};
use tracing::{debug, error, info, warn};

use crate::chat::ChatClient;
use crate::directory::Directory;
use crate::error::{Result, RuntimeError};
use crate::telemetry::Telemetry;
use crate::watcher::CompletionHandler;

/// Which forecast rendering to embed in a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForecastStyle {
    /// Location header, three slots with humidity.
    Verbose,
    /// One line per slot, five slots.
    Compact,
}

/// Builds the forecast block for a device's region.
#[derive(Clone)]
pub struct Forecaster {
    directory: Directory,
    weather: WeatherFetcher,
}

impl Forecaster {
    pub fn new(directory: Directory, weather: WeatherFetcher) -> Self {
        Self { directory, weather }
    }

    /// Forecast text for the device owner's region.
    ///
    /// Never fails: a missing region yields the region-not-found block and
    /// a weather failure yields the unavailable text.
    pub async fn block(&self, device: &DeviceId, style: ForecastStyle) -> String {
        let Some(region) = self.directory.region_for_device(device).await else {
            debug!(device = %device, "No region code for device");
            return region_not_found_block().to_string();
        };

        match style {
            ForecastStyle::Verbose => self.weather.verbose(&region).await,
            ForecastStyle::Compact => self.weather.compact(&region).await,
        }
    }
}

/// Sends rendered messages to a user's phone.
#[derive(Clone)]
pub struct StatusNotifier {
    chat: Arc<dyn ChatClient>,
}

impl StatusNotifier {
    pub fn new(chat: Arc<dyn ChatClient>) -> Self {
        Self { chat }
    }

    /// Sends `text` to the user's chat address.
    pub async fn deliver(&self, user: &User, text: &str) -> Result<()> {
        let phone = user
            .phone
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| RuntimeError::NoPhone(user.label().to_string()))?;

        let address = to_chat_address(phone);
        self.chat.send_text(&address, text).await?;
        debug!(to = %address, "Message delivered");
        Ok(())
    }
}

/// Tells a device's owner that watering has finished.
#[derive(Clone)]
pub struct CompletionNotifier {
    directory: Directory,
    telemetry: Telemetry,
    notifier: StatusNotifier,
}

impl CompletionNotifier {
    pub fn new(directory: Directory, telemetry: Telemetry, notifier: StatusNotifier) -> Self {
        Self {
            directory,
            telemetry,
            notifier,
        }
    }

    /// Reads fresh state, resolves the owner and sends the completion card.
    ///
    /// Returns `Ok(false)` when the device has no owner.
    pub async fn notify(&self, device: &DeviceId) -> Result<bool> {
        let snapshot = self.telemetry.snapshot(device).await?;
        let Some(owner) = self.directory.user_for_device(device).await? else {
            warn!(device = %device, "Watering finished on a device without owner");
            return Ok(false);
        };

        let message = StatusCard::new(&owner, device, &snapshot).completed();
        self.notifier.deliver(&owner, &message).await?;
        info!(device = %device, owner = %owner.label(), "Watering completion sent");
        Ok(true)
    }
}

#[async_trait]
impl CompletionHandler for CompletionNotifier {
    async fn on_completed(&self, device: &DeviceId) {
        if let Err(e) = self.notify(device).await {
            error!(device = %device, error = %e, "Failed to send completion notice");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingChat, StaticForecasts};
    use serde_json::json;
    use siram_store::{MemoryDocumentStore, MemoryRealtimeStore, USERS_COLLECTION};

    fn docs() -> Arc<MemoryDocumentStore> {
        let store = Arc::new(MemoryDocumentStore::new());
        store
            .upsert(
                USERS_COLLECTION,
                "u1",
                json!({
                    "raspiId": "dev-1",
                    "whatsapp": "08123456789",
                    "name": "Ani",
                    "kodeWilayah": "35.78"
                }),
            )
            .unwrap();
        store
            .upsert(USERS_COLLECTION, "u2", json!({"raspiId": "dev-2", "whatsapp": "0822"}))
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_forecast_block_without_region() {
        let forecaster = Forecaster::new(
            Directory::new(docs()),
            WeatherFetcher::new(Arc::new(StaticForecasts::sunny())),
        );
        let block = forecaster
            .block(&DeviceId::new("dev-2"), ForecastStyle::Compact)
            .await;
        assert!(block.contains("wilayah tidak ditemukan"));
    }

    #[tokio::test]
    async fn test_forecast_block_styles() {
        let forecaster = Forecaster::new(
            Directory::new(docs()),
            WeatherFetcher::new(Arc::new(StaticForecasts::sunny())),
        );
        let device = DeviceId::new("dev-1");

        let verbose = forecaster.block(&device, ForecastStyle::Verbose).await;
        assert!(verbose.contains("Lokasi:  Gubeng, Kota Surabaya, Jawa Timur"));
        assert!(verbose.contains("Kelembapan: 70%"));

        let compact = forecaster.block(&device, ForecastStyle::Compact).await;
        assert!(compact.contains("🕒 10.00 : CERAH ☀️"));
    }

    #[tokio::test]
    async fn test_deliver_requires_phone() {
        let chat = Arc::new(RecordingChat::new());
        let notifier = StatusNotifier::new(chat.clone());
        let user = User {
            id: "u9".into(),
            name: Some("Tanpa Nomor".into()),
            ..User::default()
        };

        let result = notifier.deliver(&user, "hi").await;
        assert!(matches!(result, Err(RuntimeError::NoPhone(_))));
        assert!(chat.sent().is_empty());
    }

    #[tokio::test]
    async fn test_completion_notice() {
        let realtime = Arc::new(MemoryRealtimeStore::with_root(json!({
            "users": {"dev-1": {
                "watering_status": "done",
                "last_watered": "2025-06-01 07:00",
                "data_kadar_air": {"-a": {"nilai": 64, "status": "Lembab"}}
            }}
        })));
        let chat = Arc::new(RecordingChat::new());
        let completion = CompletionNotifier::new(
            Directory::new(docs()),
            Telemetry::new(realtime),
            StatusNotifier::new(chat.clone()),
        );

        assert!(completion.notify(&DeviceId::new("dev-1")).await.unwrap());

        let sent = chat.sent_to("628123456789@s.whatsapp.net");
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("TANAMAN TELAH SELESAI DISIRAM"));
        assert!(sent[0].contains("Kadar Air: 64*%"));
        assert!(sent[0].contains("Pemilik: Ani"));
    }

    #[tokio::test]
    async fn test_completion_for_orphan_device() {
        let chat = Arc::new(RecordingChat::new());
        let completion = CompletionNotifier::new(
            Directory::new(docs()),
            Telemetry::new(Arc::new(MemoryRealtimeStore::new())),
            StatusNotifier::new(chat.clone()),
        );

        assert!(!completion.notify(&DeviceId::new("orphan")).await.unwrap());
        assert!(chat.sent().is_empty());
    }
}
