//! Shared configuration for Siram.
//!
//! # Storage Structure
//!
//! ```text
//! ~/.siram/
//! ├── config/       # .env.local with secrets
//! └── auth/         # Persisted chat session credentials
//! ```
//!
//! # Environment Variables
//!
//! - `SIRAM_STATE_DIR`: Override the base state directory
//! - `SIRAM_CREDENTIALS`: Service account JSON for the data stores (required)
//! - `SIRAM_WEATHER_URL`: Base URL of the weather service

use std::path::PathBuf;
use std::sync::OnceLock;

use serde::Deserialize;
use thiserror::Error;

/// Environment variable for custom state directory.
pub const STATE_DIR_ENV: &str = "SIRAM_STATE_DIR";

/// Environment variable holding the service account JSON.
pub const CREDENTIALS_ENV: &str = "SIRAM_CREDENTIALS";

/// Environment variable for the weather service base URL.
pub const WEATHER_URL_ENV: &str = "SIRAM_WEATHER_URL";

/// Default weather service base URL. The region code is appended as a path segment.
pub const DEFAULT_WEATHER_URL: &str = "https://avincuaca1.onrender.com/cuaca";

const DEFAULT_STATE_DIR: &str = ".siram";
const CONFIG_SUBDIR: &str = "config";
const AUTH_SUBDIR: &str = "auth";

static STATE_DIR_CACHE: OnceLock<PathBuf> = OnceLock::new();

/// Errors raised while loading startup settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required credential variable is not set.
    #[error("{0} is not set")]
    MissingCredential(&'static str),

    /// Credential variable is set but is not a usable service account.
    #[error("invalid credentials in {var}: {reason}")]
    InvalidCredential { var: &'static str, reason: String },
}

/// Get the Siram state directory.
///
/// 1. `SIRAM_STATE_DIR` environment variable if set
/// 2. `~/.siram` if home directory is available
/// 3. `.siram` in current directory as fallback
pub fn state_dir() -> PathBuf {
    STATE_DIR_CACHE
        .get_or_init(|| {
            std::env::var(STATE_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    dirs::home_dir()
                        .map(|h| h.join(DEFAULT_STATE_DIR))
                        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
                })
        })
        .clone()
}

/// Get the user config directory.
pub fn config_dir() -> PathBuf {
    state_dir().join(CONFIG_SUBDIR)
}

/// Get the chat credentials directory.
pub fn auth_dir() -> PathBuf {
    state_dir().join(AUTH_SUBDIR)
}

/// Get the .env.local file path.
pub fn env_file() -> PathBuf {
    config_dir().join(".env.local")
}

/// Service account used to reach the document and realtime stores.
///
/// Only the fields Siram reads are decoded; the secret key material is
/// kept out of `Debug` output.
#[derive(Clone, Deserialize)]
pub struct ServiceCredentials {
    pub project_id: String,
    #[serde(default)]
    pub client_email: Option<String>,
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default)]
    private_key: Option<String>,
}

impl ServiceCredentials {
    /// Returns true if the account carries key material.
    pub fn has_private_key(&self) -> bool {
        self.private_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

impl std::fmt::Debug for ServiceCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceCredentials")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("database_url", &self.database_url)
            .field("private_key", &self.has_private_key().then_some("<redacted>"))
            .finish()
    }
}

/// Startup settings resolved from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub credentials: ServiceCredentials,
    pub weather_url: String,
}

impl Settings {
    /// Load settings from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw = lookup(CREDENTIALS_ENV)
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::MissingCredential(CREDENTIALS_ENV))?;

        let credentials: ServiceCredentials =
            serde_json::from_str(&raw).map_err(|e| ConfigError::InvalidCredential {
                var: CREDENTIALS_ENV,
                reason: e.to_string(),
            })?;

        let weather_url = lookup(WEATHER_URL_ENV)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_WEATHER_URL.to_string());

        Ok(Self {
            credentials,
            weather_url: weather_url.trim_end_matches('/').to_string(),
        })
    }
}
