//! Siram Core - shared business logic for the plant watering notifier.
//!
//! - **config**: state directories and startup settings
//! - **phone**: conversion between stored phone numbers and chat addresses
//! - **template**: status message rendering
//! - **weather**: forecast fetching and the upstream response adapter

pub mod config;
pub mod phone;
pub mod template;
pub mod weather;

pub use config::{ConfigError, ServiceCredentials, Settings};
pub use phone::{is_group_address, phone_from_address, to_chat_address};
pub use template::{region_not_found_block, StatusCard};
pub use weather::{
    ForecastSource, HttpForecastSource, WeatherError, WeatherFetcher, FORECAST_NOT_FOUND,
    FORECAST_UNAVAILABLE,
};
