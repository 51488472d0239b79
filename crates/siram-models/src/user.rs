//! Plant owner records.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::ids::DeviceId;

/// A plant owner as stored in the `users` collection.
///
/// Records are created by an external onboarding flow and are read-only
/// here. Every attribute may be missing or hold an unexpected type; such
/// attributes decode as absent instead of failing the whole record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Document id in the user collection.
    #[serde(skip)]
    pub id: String,

    /// Device owned by this user.
    #[serde(
        rename = "raspiId",
        default,
        deserialize_with = "lenient_device",
        skip_serializing_if = "Option::is_none"
    )]
    pub device_id: Option<DeviceId>,

    /// Phone number in local format (leading trunk prefix `0`).
    #[serde(
        rename = "whatsapp",
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub phone: Option<String>,

    /// Display name.
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,

    /// Region code used to query the weather service.
    #[serde(
        rename = "kodeWilayah",
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub region_code: Option<String>,
}

impl User {
    /// Decodes a stored document body and attaches its id.
    pub fn from_document(
        id: impl Into<String>,
        data: &serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        let mut user: User = serde_json::from_value(data.clone())?;
        user.id = id.into();
        Ok(user)
    }

    /// Name used in log lines: the display name, else the device id, else the document id.
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .or_else(|| self.device_id.as_ref().map(DeviceId::as_str))
            .unwrap_or(&self.id)
    }

    /// Region code, treating an empty string as absent.
    pub fn region(&self) -> Option<&str> {
        self.region_code.as_deref().filter(|r| !r.is_empty())
    }
}

/// Strings pass through and numbers are rendered; anything else is absent.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Device ids are matched as strings, so only a non-empty string counts.
fn lenient_device<'de, D>(deserializer: D) -> Result<Option<DeviceId>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.is_empty() => Some(DeviceId::new(s)),
        _ => None,
    })
}
