//! Status message templates.
//!
//! Every field falls back to [`PLACEHOLDER`] when missing, so rendering
//! never fails.

use siram_models::{DeviceId, DeviceSnapshot, User, PLACEHOLDER};

const HEADER: &str = "🌱 *SISTEM PENYIRAMAN TANAMAN* 🌱\n\n";
const COMPLETED_BANNER: &str = "✅ *TANAMAN TELAH SELESAI DISIRAM.*✅\n\n\n";
const REGION_NOT_FOUND: &str = "Kode wilayah tidak ditemukan untuk user ini.\n\n";

/// Forecast block used when the device has no region code.
pub fn region_not_found_block() -> &'static str {
    REGION_NOT_FOUND
}

/// Field values of one device, ready to be rendered into a message.
#[derive(Debug, Clone)]
pub struct StatusCard {
    owner: String,
    device_id: String,
    last_watered: String,
    moisture: String,
    health: String,
    watering_status: String,
    watering_method: String,
}

impl StatusCard {
    /// Collects the fields shown to the owner.
    pub fn new(user: &User, device_id: &DeviceId, snapshot: &DeviceSnapshot) -> Self {
        let latest = snapshot.latest.as_ref();
        let text = |value: Option<String>| value.unwrap_or_else(|| PLACEHOLDER.to_string());

        Self {
            owner: text(user.name.clone()),
            device_id: device_id.to_string(),
            last_watered: text(snapshot.status.last_watered.clone()),
            moisture: text(latest.and_then(|r| r.moisture_text())),
            health: text(latest.and_then(|r| r.health.clone())),
            watering_status: text(snapshot.status.watering_status.map(|s| s.to_string())),
            watering_method: text(snapshot.status.watering_method.map(|m| m.to_string())),
        }
    }

    /// Message sent when a watering run has finished.
    pub fn completed(&self) -> String {
        let mut message = String::from(HEADER);
        message.push_str(&format!("📱 *Pemilik: {}*\n", self.owner));
        message.push_str(&format!("🆔 Device ID: *{}*\n", self.device_id));
        message.push_str(&format!("⏰ *Terakhir Disiram: {}*\n\n\n", self.last_watered));
        message.push_str(COMPLETED_BANNER);
        message.push_str(&format!("💧 *Kadar Air: {}*%\n", self.moisture));
        message.push_str(&format!("🔄 Status: {}\n", self.health));
        message.push_str(&format!("🚿 Status Penyiraman: {}\n", self.watering_status));
        message.push_str(&format!("🚿 Methode Penyiraman: {}", self.watering_method));
        message
    }

    /// Reply to an owner's `status` request, with the verbose forecast block.
    pub fn status_reply(&self, forecast: &str) -> String {
        let mut message = String::from(HEADER);
        message.push_str(&format!("📱 *Pemilik: {}*\n", self.owner));
        message.push_str(&format!("🆔 Device ID: {}\n", self.device_id));
        message.push_str(&format!("⏰ *Terakhir Disiram: {}*\n\n\n", self.last_watered));
        message.push_str(&format!("💧 *Kadar Air: {}%*\n", self.moisture));
        message.push_str(&format!("🔄 Status: {}\n", self.health));
        message.push_str(&format!("🚿 Methode Penyiraman: {}\n\n", self.watering_method));
        message.push_str(forecast);
        message.push_str("\n\n ketik *SIRAM SEKARANG* untuk menyiram tanaman.");
        message
    }

    /// Scheduled status message, with the compact forecast block.
    pub fn periodic(&self, forecast: &str) -> String {
        let mut message = String::from(HEADER);
        message.push_str(&format!("📱 *Pemilik: {}*\n", self.owner));
        message.push_str(&format!("⏰ *Terakhir Disiram: {}*\n\n\n", self.last_watered));
        message.push_str(&format!("💧 *Kadar Air: {}%*\n", self.moisture));
        message.push_str(&format!("🔄 Status: {}\n", self.health));
        message.push_str(forecast);
        message.push_str("\n\nKetik *SIRAM SEKARANG* untuk menyiram tanaman.");
        message
    }
}
