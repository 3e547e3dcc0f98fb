use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single position fix. Replaced wholesale on every successful acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Parsed body of the OpenWeather current-weather endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    #[serde(default)]
    pub coord: Option<GeoPoint>,
    #[serde(default)]
    pub weather: Vec<Condition>,
    #[serde(default)]
    pub base: String,
    pub main: MainReadings,
    #[serde(default)]
    pub visibility: Option<u32>,
    #[serde(default)]
    pub wind: Option<Wind>,
    #[serde(default)]
    pub rain: Option<Precipitation>,
    #[serde(default)]
    pub snow: Option<Precipitation>,
    #[serde(default)]
    pub clouds: Option<Clouds>,
    pub dt: i64,
    #[serde(default)]
    pub sys: Option<Sys>,
    #[serde(default)]
    pub timezone: i64,
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cod: i64,
}

impl WeatherSnapshot {
    /// Observation time reported by the provider.
    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.dt, 0)
    }

    pub fn sunrise(&self) -> Option<DateTime<Utc>> {
        self.sys.as_ref().and_then(|s| DateTime::from_timestamp(s.sunrise, 0))
    }

    pub fn sunset(&self) -> Option<DateTime<Utc>> {
        self.sys.as_ref().and_then(|s| DateTime::from_timestamp(s.sunset, 0))
    }

    pub fn first_condition(&self) -> Option<&Condition> {
        self.weather.first()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

/// One entry of the ordered condition list; `icon` is e.g. `"10d"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub id: i64,
    pub main: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainReadings {
    pub temp: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    #[serde(default)]
    pub pressure: u32,
    pub humidity: u8,
    #[serde(default)]
    pub sea_level: Option<u32>,
    #[serde(default)]
    pub grnd_level: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub speed: f64,
    #[serde(default)]
    pub deg: u16,
    #[serde(default)]
    pub gust: Option<f64>,
}

/// Rain or snow volume in millimetres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Precipitation {
    #[serde(rename = "1h", default)]
    pub one_hour: Option<f64>,
    #[serde(rename = "3h", default)]
    pub three_hours: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clouds {
    pub all: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sys {
    #[serde(rename = "type", default)]
    pub kind: Option<i64>,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub country: String,
    pub sunrise: i64,
    pub sunset: i64,
}

/// One entry of the reverse-geocode result array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub name: String,
    #[serde(default)]
    pub local_names: Option<HashMap<String, String>>,
    pub lat: f64,
    pub lon: f64,
    pub country: String,
    #[serde(default)]
    pub state: Option<String>,
}

/// Everything the presentation layer observes. Published through a
/// `watch` channel by [`crate::LocationWeatherService`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherState {
    pub coordinates: Option<Coordinates>,
    /// Last successful weather response; kept when a later fetch fails.
    pub weather: Option<WeatherSnapshot>,
    /// Last successful reverse-geocode response.
    pub locations: Option<Vec<LocationRecord>>,
    pub acquiring_position: bool,
    pub fetching_weather: bool,
    pub fetching_location: bool,
    pub location_error: Option<String>,
    pub weather_fetch_error: Option<String>,
    pub location_fetch_error: Option<String>,
    /// Set only when both lookups of a refresh cycle succeeded.
    pub last_updated: Option<DateTime<Utc>>,
}

impl WeatherState {
    pub fn location_record(&self) -> Option<&LocationRecord> {
        self.locations.as_ref().and_then(|l| l.first())
    }
}
