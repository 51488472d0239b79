//! Error types for the bot.

use siram_core::{ConfigError, WeatherError};
use siram_runtime::{ChatError, RuntimeError};
use thiserror::Error;

/// Errors that can occur in the bot.
#[derive(Debug, Error)]
pub enum BotError {
    /// Startup settings missing or invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Runtime error.
    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    /// Chat send error.
    #[error("chat error: {0}")]
    Chat(#[from] ChatError),

    /// Weather client could not be built.
    #[error("weather error: {0}")]
    Weather(#[from] WeatherError),

    /// Seed fixture is not usable.
    #[error("invalid seed file: {0}")]
    InvalidSeed(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for bot operations.
pub type Result<T> = std::result::Result<T, BotError>;
