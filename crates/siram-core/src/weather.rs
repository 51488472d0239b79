//! Weather forecasts for a device's region.
//!
//! The fetcher never fails towards its callers: transport errors, timeouts
//! and malformed bodies all render as [`FORECAST_UNAVAILABLE`].

pub mod adapter;

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use siram_models::device::format_number;
use siram_models::{Forecast, ForecastReport, PLACEHOLDER};
use thiserror::Error;
use tracing::{debug, warn};

/// Default bound on a weather request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Text used when the service could not be reached or understood.
pub const FORECAST_UNAVAILABLE: &str = "Maaf, data prakiraan cuaca tidak tersedia saat ini.\n\n";

/// Text used when the response holds no usable forecast slot.
pub const FORECAST_NOT_FOUND: &str = "Data prakiraan cuaca tidak ditemukan.";

/// Slots shown in the verbose block.
const VERBOSE_ENTRIES: usize = 3;

/// Slots shown in the compact block.
const COMPACT_ENTRIES: usize = 5;

static CLOCK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{2}:\d{2}").expect("Invalid clock regex"));

/// Errors that can occur while fetching a forecast.
#[derive(Error, Debug)]
pub enum WeatherError {
    /// HTTP request failed or returned an error status.
    #[error("weather request failed: {0}")]
    RequestFailed(String),

    /// The service did not answer in time.
    #[error("weather request timed out after {0:?}")]
    Timeout(Duration),

    /// The body could not be decoded.
    #[error("malformed weather response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for WeatherError {
    fn from(e: reqwest::Error) -> Self {
        WeatherError::RequestFailed(e.to_string())
    }
}

/// Something that can return the raw forecast body for a region.
#[async_trait]
pub trait ForecastSource: Send + Sync {
    /// Fetches the raw JSON body for a region code.
    async fn fetch(&self, region_code: &str) -> Result<Value, WeatherError>;
}

/// Forecast source backed by the weather HTTP service.
#[derive(Debug, Clone)]
pub struct HttpForecastSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpForecastSource {
    /// Creates a source for `{base_url}/{region}` with the given request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, WeatherError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// URL requested for a region code.
    pub fn url_for(&self, region_code: &str) -> String {
        format!("{}/{}", self.base_url, region_code)
    }
}

#[async_trait]
impl ForecastSource for HttpForecastSource {
    async fn fetch(&self, region_code: &str) -> Result<Value, WeatherError> {
        let url = self.url_for(region_code);
        debug!(url = %url, "Fetching forecast");

        let response = self.client.get(&url).send().await?.error_for_status()?;

        response
            .json::<Value>()
            .await
            .map_err(|e| WeatherError::Malformed(e.to_string()))
    }
}

/// Fetches and renders forecasts.
#[derive(Clone)]
pub struct WeatherFetcher {
    source: Arc<dyn ForecastSource>,
    timeout: Duration,
}

impl WeatherFetcher {
    /// Creates a fetcher with the default 10s bound.
    pub fn new(source: Arc<dyn ForecastSource>) -> Self {
        Self {
            source,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the request bound.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fetches and decodes the forecast for a region.
    pub async fn report(&self, region_code: &str) -> Result<ForecastReport, WeatherError> {
        let body = tokio::time::timeout(self.timeout, self.source.fetch(region_code))
            .await
            .map_err(|_| WeatherError::Timeout(self.timeout))??;
        adapter::parse_report(&body)
    }

    /// Multi-line block with humidity, for status replies.
    pub async fn verbose(&self, region_code: &str) -> String {
        match self.report(region_code).await {
            Ok(report) => render_verbose(&report),
            Err(e) => {
                warn!(region = %region_code, error = %e, "Failed to fetch forecast");
                FORECAST_UNAVAILABLE.to_string()
            }
        }
    }

    /// One line per slot with an icon, for scheduled messages.
    pub async fn compact(&self, region_code: &str) -> String {
        match self.report(region_code).await {
            Ok(report) => render_compact(&report),
            Err(e) => {
                warn!(region = %region_code, error = %e, "Failed to fetch forecast");
                FORECAST_UNAVAILABLE.to_string()
            }
        }
    }
}

/// Icon shown next to a compact forecast line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherIcon {
    Rain,
    Sun,
    Cloud,
    Overcast,
}

impl WeatherIcon {
    /// Picks an icon by keyword in an upper-cased description.
    pub fn for_description(description: &str) -> Self {
        let has = |keywords: &[&str]| keywords.iter().any(|k| description.contains(k));
        if has(&["HUJAN", "RAIN"]) {
            WeatherIcon::Rain
        } else if has(&["CERAH", "CLEAR"]) {
            WeatherIcon::Sun
        } else if has(&["BERAWAN", "CLOUDY"]) {
            WeatherIcon::Cloud
        } else {
            WeatherIcon::Overcast
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            WeatherIcon::Rain => "🌧️",
            WeatherIcon::Sun => "☀️",
            WeatherIcon::Cloud => "🌥️",
            WeatherIcon::Overcast => "☁️",
        }
    }
}

/// Renders the verbose block: header, location and the first three slots.
pub fn render_verbose(report: &ForecastReport) -> String {
    let location = &report.location;
    let part = |p: &Option<String>| p.clone().unwrap_or_else(|| PLACEHOLDER.to_string());

    let mut message = String::from("\n*Prakiraan Cuaca 3 Jam ke Depan*\n");
    message.push_str(&format!(
        "Lokasi:  {}, {}, {}\n\n",
        part(&location.district),
        part(&location.city),
        part(&location.province)
    ));

    if report.is_empty() {
        message.push_str(FORECAST_NOT_FOUND);
        message.push_str("\n\n");
        return message;
    }

    for forecast in report.entries.iter().take(VERBOSE_ENTRIES) {
        message.push_str(&format!("🕒 *{}*\n", part(&forecast.local_time)));
        message.push_str(&format!("Cuaca: {}\n", part(&forecast.description)));
        message.push_str(&format!("Suhu: {}°C\n", number_or_placeholder(forecast.temperature)));
        message.push_str(&format!(
            "Kelembapan: {}%\n\n",
            number_or_placeholder(forecast.humidity)
        ));
    }
    message
}

/// Renders the compact block: one line for each of the first five slots.
pub fn render_compact(report: &ForecastReport) -> String {
    if report.is_empty() {
        return FORECAST_NOT_FOUND.to_string();
    }

    let mut message = String::from("*Prediksi Cuaca*\n");
    for forecast in report.entries.iter().take(COMPACT_ENTRIES) {
        let description = forecast
            .description
            .as_deref()
            .unwrap_or(PLACEHOLDER)
            .to_uppercase();
        let icon = WeatherIcon::for_description(&description);
        message.push_str(&format!(
            "🕒 {} : {} {}\n",
            clock_label(forecast),
            description,
            icon.emoji()
        ));
    }
    message
}

/// `HH.MM` taken from the slot's local time, or the raw text if it has no clock.
fn clock_label(forecast: &Forecast) -> String {
    match forecast.local_time.as_deref() {
        Some(time) => CLOCK_REGEX
            .find(time)
            .map(|m| m.as_str().replace(':', "."))
            .unwrap_or_else(|| time.to_string()),
        None => PLACEHOLDER.to_string(),
    }
}

fn number_or_placeholder(value: Option<f64>) -> String {
    value
        .map(format_number)
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use siram_models::ForecastLocation;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticSource(Result<Value, String>);

    #[async_trait]
    impl ForecastSource for StaticSource {
        async fn fetch(&self, _region_code: &str) -> Result<Value, WeatherError> {
            self.0.clone().map_err(WeatherError::RequestFailed)
        }
    }

    struct SlowSource;

    #[async_trait]
    impl ForecastSource for SlowSource {
        async fn fetch(&self, _region_code: &str) -> Result<Value, WeatherError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(json!([]))
        }
    }

    struct CountingSource(AtomicUsize);

    #[async_trait]
    impl ForecastSource for CountingSource {
        async fn fetch(&self, region_code: &str) -> Result<Value, WeatherError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            assert_eq!(region_code, "35.78");
            Ok(json!(["no", "pointers", "here"]))
        }
    }

    fn slot(time: &str, description: &str) -> Forecast {
        Forecast {
            local_time: Some(time.to_string()),
            description: Some(description.to_string()),
            temperature: Some(28.0),
            humidity: Some(75.0),
            icon: None,
        }
    }

    fn report(entries: Vec<Forecast>) -> ForecastReport {
        ForecastReport {
            location: ForecastLocation {
                district: Some("Gubeng".into()),
                city: Some("Kota Surabaya".into()),
                province: Some("Jawa Timur".into()),
            },
            entries,
        }
    }

    #[test]
    fn test_icon_keywords() {
        assert_eq!(WeatherIcon::for_description("HUJAN RINGAN"), WeatherIcon::Rain);
        assert_eq!(WeatherIcon::for_description("CERAH BERAWAN"), WeatherIcon::Sun);
        assert_eq!(WeatherIcon::for_description("BERAWAN"), WeatherIcon::Cloud);
        assert_eq!(WeatherIcon::for_description("LIGHT RAIN"), WeatherIcon::Rain);
        assert_eq!(WeatherIcon::for_description("KABUT"), WeatherIcon::Overcast);
    }

    #[test]
    fn test_render_verbose_limits_to_three() {
        let entries = (0..5)
            .map(|i| slot(&format!("2025-06-01 {:02}:00:00", 10 + i), "Cerah"))
            .collect();
        let message = render_verbose(&report(entries));
        assert!(message.starts_with("\n*Prakiraan Cuaca 3 Jam ke Depan*\n"));
        assert!(message.contains("Lokasi:  Gubeng, Kota Surabaya, Jawa Timur\n\n"));
        assert_eq!(message.matches("🕒").count(), 3);
        assert!(message.contains("Suhu: 28°C\nKelembapan: 75%\n\n"));
    }

    #[test]
    fn test_render_compact_limits_to_five() {
        let entries = (0..7)
            .map(|i| slot(&format!("2025-06-01 {:02}:00:00", 10 + i), "Hujan Ringan"))
            .collect();
        let message = render_compact(&report(entries));
        assert!(message.starts_with("*Prediksi Cuaca*\n"));
        assert_eq!(message.lines().count(), 6);
        assert!(message.contains("🕒 10.00 : HUJAN RINGAN 🌧️\n"));
        assert!(!message.contains("15.00"));
    }

    #[test]
    fn test_clock_label_without_time() {
        assert_eq!(clock_label(&slot("besok", "Cerah")), "besok");
        assert_eq!(clock_label(&Forecast::default()), "-");
    }

    #[test]
    fn test_empty_report_text() {
        assert_eq!(render_compact(&report(vec![])), FORECAST_NOT_FOUND);
        assert!(render_verbose(&report(vec![]))
            .ends_with("Data prakiraan cuaca tidak ditemukan.\n\n"));
    }

    #[tokio::test]
    async fn test_no_entries_returns_not_found() {
        let source = Arc::new(CountingSource(AtomicUsize::new(0)));
        let fetcher = WeatherFetcher::new(source.clone());
        assert_eq!(fetcher.compact("35.78").await, FORECAST_NOT_FOUND);
        assert_eq!(source.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transport_failure_degrades() {
        let fetcher = WeatherFetcher::new(Arc::new(StaticSource(Err("connection refused".into()))));
        assert_eq!(fetcher.verbose("35.78").await, FORECAST_UNAVAILABLE);
        assert_eq!(fetcher.compact("35.78").await, FORECAST_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_non_array_body_degrades() {
        let fetcher = WeatherFetcher::new(Arc::new(StaticSource(Ok(json!({"message": "oops"})))));
        assert_eq!(fetcher.compact("35.78").await, FORECAST_UNAVAILABLE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_bound() {
        let fetcher = WeatherFetcher::new(Arc::new(SlowSource));
        let result = fetcher.report("35.78").await;
        assert!(matches!(result, Err(WeatherError::Timeout(d)) if d == DEFAULT_TIMEOUT));
        assert_eq!(fetcher.verbose("35.78").await, FORECAST_UNAVAILABLE);
    }

    #[test]
    fn test_http_source_url() {
        let source =
            HttpForecastSource::new("https://weather.example/cuaca/", DEFAULT_TIMEOUT).unwrap();
        assert_eq!(source.url_for("35.78.01"), "https://weather.example/cuaca/35.78.01");
    }
}
