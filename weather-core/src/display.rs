//! Display values derived from a [`WeatherState`] snapshot.
//!
//! Every accessor is a pure function of the snapshot and yields a defined
//! default when the underlying data is absent.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::WeatherState;

/// Locale requested from the weather endpoint and preferred for place names.
pub const DISPLAY_LOCALE: &str = "zh_tw";
/// Second choice when a place has no name for [`DISPLAY_LOCALE`].
pub const DISPLAY_LOCALE_FALLBACK: &str = "zh";

const ICON_URL_BASE: &str = "https://openweathermap.org/img/wn";

/// Rounds half-way values toward positive infinity (`-2.5` becomes `-2`).
fn round_half_up(value: f64) -> i64 {
    // Adding 0.5 before flooring would turn 0.49999999999999994 into 1.
    let floor = value.floor();
    if value - floor >= 0.5 {
        floor as i64 + 1
    } else {
        floor as i64
    }
}

impl WeatherState {
    pub fn temperature(&self) -> i64 {
        self.weather.as_ref().map(|w| round_half_up(w.main.temp)).unwrap_or(0)
    }

    pub fn feels_like(&self) -> Option<i64> {
        self.weather.as_ref().map(|w| round_half_up(w.main.feels_like))
    }

    pub fn humidity(&self) -> Option<u8> {
        self.weather.as_ref().map(|w| w.main.humidity)
    }

    pub fn wind_speed(&self) -> Option<f64> {
        self.weather.as_ref().and_then(|w| w.wind.as_ref()).map(|wind| wind.speed)
    }

    /// Kilometres with one decimal place, ties rounded up (`1250` is `"1.3"`).
    /// Zero visibility counts as absent.
    pub fn visibility(&self) -> Option<String> {
        self.weather
            .as_ref()
            .and_then(|w| w.visibility)
            .filter(|metres| *metres > 0)
            .map(|metres| {
                let tenths = (u64::from(metres) + 50) / 100;
                format!("{}.{}", tenths / 10, tenths % 10)
            })
    }

    pub fn weather_icon_url(&self) -> String {
        self.weather
            .as_ref()
            .and_then(|w| w.first_condition())
            .map(|c| format!("{ICON_URL_BASE}/{}@2x.png", c.icon))
            .unwrap_or_default()
    }

    pub fn weather_description(&self) -> String {
        self.weather
            .as_ref()
            .and_then(|w| w.first_condition())
            .map(|c| c.description.clone())
            .unwrap_or_default()
    }

    pub fn city_name(&self) -> String {
        let Some(record) = self.location_record() else {
            return String::new();
        };

        record
            .local_names
            .as_ref()
            .and_then(|names| {
                [DISPLAY_LOCALE, DISPLAY_LOCALE_FALLBACK]
                    .into_iter()
                    .filter_map(|tag| names.get(tag))
                    .find(|name| !name.is_empty())
            })
            .unwrap_or(&record.name)
            .clone()
    }

    /// `"{city}, {state}, {country}"`, or `"{city}, {country}"` without a subdivision.
    pub fn full_location(&self) -> String {
        let Some(record) = self.location_record() else {
            return String::new();
        };

        let city = self.city_name();
        match record.state.as_deref().filter(|s| !s.is_empty()) {
            Some(state) => format!("{city}, {state}, {}", record.country),
            None => format!("{city}, {}", record.country),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.acquiring_position || self.fetching_weather || self.fetching_location
    }

    /// Position error first, then weather fetch error, then location fetch error.
    pub fn error(&self) -> Option<&str> {
        [&self.location_error, &self.weather_fetch_error, &self.location_fetch_error]
            .into_iter()
            .filter_map(|e| e.as_deref())
            .find(|e| !e.is_empty())
    }

    pub fn summary(&self) -> WeatherSummary {
        WeatherSummary {
            temperature: self.temperature(),
            feels_like: self.feels_like(),
            humidity: self.humidity(),
            wind_speed: self.wind_speed(),
            visibility: self.visibility(),
            weather_icon_url: self.weather_icon_url(),
            weather_description: self.weather_description(),
            city_name: self.city_name(),
            full_location: self.full_location(),
            sunrise: self.weather.as_ref().and_then(|w| w.sunrise()),
            sunset: self.weather.as_ref().and_then(|w| w.sunset()),
            last_updated: self.last_updated,
            is_loading: self.is_loading(),
            error: self.error().map(str::to_string),
        }
    }
}

/// Serializable bundle of every derived value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherSummary {
    pub temperature: i64,
    pub feels_like: Option<i64>,
    pub humidity: Option<u8>,
    pub wind_speed: Option<f64>,
    pub visibility: Option<String>,
    pub weather_icon_url: String,
    pub weather_description: String,
    pub city_name: String,
    pub full_location: String,
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
    pub last_updated: Option<DateTime<Utc>>,
    pub is_loading: bool,
    pub error: Option<String>,
}
