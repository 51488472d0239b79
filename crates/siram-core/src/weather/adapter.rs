//! Decoder for the weather service's pointer-table response.
//!
//! The upstream body is a flat JSON array. Some entries are arrays of
//! integer indices pointing at detail objects elsewhere in the same array,
//! and the detail objects' fields are indices again:
//!
//! ```text
//! [ ..., [7, 12], ...,
//!   {"local_datetime": 8, "t": 9, "weather_desc": 10, "hu": 11},
//!   "2025-06-01 10:00:00", 29, "Cerah", 70, ... ]
//! ```
//!
//! Nothing outside this module sees that shape.

use serde_json::Value;
use siram_models::{Forecast, ForecastLocation, ForecastReport};

use super::WeatherError;

const PROVINCE_SLOT: usize = 18;
const CITY_SLOT: usize = 19;
const DISTRICT_SLOT: usize = 20;

/// Decodes a full response body into a report.
///
/// Slots that do not look like forecast details are skipped; only a body
/// that is not an array at all is an error.
pub fn parse_report(body: &Value) -> Result<ForecastReport, WeatherError> {
    let table = body
        .as_array()
        .ok_or_else(|| WeatherError::Malformed("response body is not an array".to_string()))?;

    let location = ForecastLocation {
        district: location_slot(table, DISTRICT_SLOT),
        city: location_slot(table, CITY_SLOT),
        province: location_slot(table, PROVINCE_SLOT),
    };

    let mut entries = Vec::new();
    for item in table {
        let Some(pointers) = item.as_array() else {
            continue;
        };
        if !pointers.iter().all(Value::is_number) {
            continue;
        }
        for pointer in pointers {
            if let Some(forecast) = resolve(table, pointer).and_then(|d| decode_detail(table, d)) {
                entries.push(forecast);
            }
        }
    }

    Ok(ForecastReport { location, entries })
}

/// Follows an index into the table. Non-integer or out-of-range pointers resolve to nothing.
fn resolve<'a>(table: &'a [Value], pointer: &Value) -> Option<&'a Value> {
    let index = usize::try_from(pointer.as_u64()?).ok()?;
    table.get(index)
}

/// Decodes one forecast slot. Every field, `hu` and `image` included, is a
/// pointer into the table; the raw `hu` value is an index, not a humidity.
fn decode_detail(table: &[Value], detail: &Value) -> Option<Forecast> {
    let fields = detail.as_object()?;

    let local_time = fields.get("local_datetime")?;
    let temperature = fields.get("t").filter(|t| t.is_number())?;
    let description = fields.get("weather_desc")?;

    Some(Forecast {
        local_time: resolve(table, local_time).and_then(text),
        description: resolve(table, description).and_then(text),
        temperature: resolve(table, temperature).and_then(number),
        humidity: fields
            .get("hu")
            .and_then(|hu| resolve(table, hu))
            .and_then(number),
        icon: fields
            .get("image")
            .and_then(|image| resolve(table, image))
            .and_then(text),
    })
}

fn location_slot(table: &[Value], slot: usize) -> Option<String> {
    match table.get(slot)? {
        Value::Object(fields) => fields.get("description").and_then(text),
        other => text(other),
    }
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
