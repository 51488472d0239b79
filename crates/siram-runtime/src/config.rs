//! Runtime configuration.

use std::time::Duration;

/// Default interval between scheduled status messages.
pub const DEFAULT_BROADCAST_PERIOD: Duration = Duration::from_secs(2 * 60 * 60);

/// Default pause before reopening a lost chat connection.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Configuration for the runtime.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// How often every owner gets a scheduled status message.
    pub broadcast_period: Duration,
    /// Bound on a single weather request.
    pub weather_timeout: Duration,
    /// Pause before reopening a lost chat connection.
    pub reconnect_delay: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            broadcast_period: DEFAULT_BROADCAST_PERIOD,
            weather_timeout: siram_core::weather::DEFAULT_TIMEOUT,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }
}

impl RuntimeConfig {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the broadcast period.
    pub fn with_broadcast_period(mut self, period: Duration) -> Self {
        self.broadcast_period = period;
        self
    }

    /// Sets the weather request bound.
    pub fn with_weather_timeout(mut self, timeout: Duration) -> Self {
        self.weather_timeout = timeout;
        self
    }

    /// Sets the reconnect pause.
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }
}
