//! Core data models for Siram.
//!
//! This crate provides the data types shared by every Siram crate: plant
//! owners, device status trees, sensor readings and weather forecasts.

pub mod device;
pub mod forecast;
pub mod ids;
pub mod user;

pub use device::{DeviceSnapshot, DeviceStatus, SensorReading, WateringMethod, WateringStatus};
pub use forecast::{Forecast, ForecastLocation, ForecastReport};
pub use ids::DeviceId;
pub use user::User;

/// Placeholder rendered for any field that is missing.
pub const PLACEHOLDER: &str = "-";
