//! Inbound message handling.

use siram_core::{is_group_address, phone_from_address, StatusCard};
use siram_runtime::{ChatClient, Directory, ForecastStyle, Forecaster, PlantService, Telemetry};
use tracing::{debug, info};

use crate::error::Result;
use crate::session::InboundMessage;

/// Reply to a sender that is not in the user collection.
pub const ACCESS_DENIED: &str = "⛔ Akses ditolak! Nomor tidak terdaftar.";

/// Reply to a registered sender that owns no device.
pub const NO_DEVICE: &str = "⛔ Nomor terdaftar, tetapi belum terhubung ke perangkat.";

/// Commands understood by the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Status card with the verbose forecast.
    Status,
    /// Manual watering request.
    Water,
}

impl Command {
    /// Matches on substrings of the trimmed, lower-cased text.
    /// `status` wins over `siram` when both appear.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim().to_lowercase();
        if text.contains("status") {
            Some(Command::Status)
        } else if text.contains("siram") {
            Some(Command::Water)
        } else {
            None
        }
    }
}

/// Answers owner commands.
#[derive(Clone)]
pub struct CommandHandler {
    directory: Directory,
    telemetry: Telemetry,
    forecaster: Forecaster,
}

impl CommandHandler {
    pub fn new(directory: Directory, telemetry: Telemetry, forecaster: Forecaster) -> Self {
        Self {
            directory,
            telemetry,
            forecaster,
        }
    }

    /// Handler sharing the service's lookups.
    pub fn for_service(service: &PlantService) -> Self {
        Self::new(
            service.directory().clone(),
            service.telemetry().clone(),
            service.forecaster().clone(),
        )
    }

    /// Computes the reply to a message, if any.
    pub async fn reply_to(&self, message: &InboundMessage) -> Result<Option<String>> {
        if message.from_me || is_group_address(&message.sender) {
            return Ok(None);
        }
        let Some(text) = message.text.as_deref() else {
            return Ok(None);
        };

        let phone = phone_from_address(&message.sender);
        let Some(user) = self.directory.user_by_phone(&phone).await? else {
            info!(sender = %phone, "Message from unregistered number");
            return Ok(Some(ACCESS_DENIED.to_string()));
        };

        let Some(command) = Command::parse(text) else {
            debug!(sender = %phone, "Ignoring message without command");
            return Ok(None);
        };
        let Some(device) = user.device_id.clone() else {
            return Ok(Some(NO_DEVICE.to_string()));
        };

        let reply = match command {
            Command::Status => {
                let snapshot = self.telemetry.snapshot(&device).await?;
                let forecast = self.forecaster.block(&device, ForecastStyle::Verbose).await;
                StatusCard::new(&user, &device, &snapshot).status_reply(&forecast)
            }
            Command::Water => {
                self.telemetry.request_watering(&device).await?;
                format!("🚿 Memulai penyiraman untuk device {}", device)
            }
        };
        info!(sender = %phone, device = %device, ?command, "Command handled");
        Ok(Some(reply))
    }

    /// Computes the reply and sends it back to the sender.
    pub async fn respond(&self, client: &dyn ChatClient, message: &InboundMessage) -> Result<()> {
        if let Some(reply) = self.reply_to(message).await? {
            client.send_text(&message.sender, &reply).await?;
        }
        Ok(())
    }
}
