//! Weather forecast records.
//!
//! These are derived per request from the weather service response and are
//! never persisted.

/// One forecast slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forecast {
    /// Local date and time of the slot, as given by the upstream service.
    pub local_time: Option<String>,
    /// Weather description.
    pub description: Option<String>,
    /// Temperature in degrees Celsius.
    pub temperature: Option<f64>,
    /// Relative humidity in percent.
    pub humidity: Option<f64>,
    /// Reference to the upstream weather icon.
    pub icon: Option<String>,
}

/// Administrative location of a forecast.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastLocation {
    pub district: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
}

/// Forecast slots for one region, in upstream order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastReport {
    pub location: ForecastLocation,
    pub entries: Vec<Forecast>,
}

impl ForecastReport {
    /// Returns true when no usable slot was found.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
