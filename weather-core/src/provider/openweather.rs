use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::{
    Coordinates, FetchError, LocationRecord, WeatherSnapshot, config::Endpoints,
    display::DISPLAY_LOCALE,
};

use super::WeatherProvider;

const EXCLUDED_PARTS: &str = "minutely,hourly,daily,alerts";
const UNITS: &str = "metric";
const REVERSE_GEOCODE_LIMIT: &str = "1";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    endpoints: Endpoints,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(endpoints: Endpoints) -> Self {
        Self { endpoints, http: Client::new() }
    }

    /// `{weather_base}/weather?appid=&lat=&lon=&exclude=&units=metric&lang=`
    pub fn weather_url(&self, coords: Coordinates) -> Result<Url, FetchError> {
        let lat = coords.latitude.to_string();
        let lon = coords.longitude.to_string();

        let url = Url::parse_with_params(
            &format!("{}/weather", self.endpoints.weather_base),
            &[
                ("appid", self.endpoints.api_key.as_str()),
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("exclude", EXCLUDED_PARTS),
                ("units", UNITS),
                ("lang", DISPLAY_LOCALE),
            ],
        )?;

        Ok(url)
    }

    /// `{geo_base}/reverse?appid=&lat=&lon=&limit=1`
    pub fn reverse_geocode_url(&self, coords: Coordinates) -> Result<Url, FetchError> {
        let lat = coords.latitude.to_string();
        let lon = coords.longitude.to_string();

        let url = Url::parse_with_params(
            &format!("{}/reverse", self.endpoints.geo_base),
            &[
                ("appid", self.endpoints.api_key.as_str()),
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("limit", REVERSE_GEOCODE_LIMIT),
            ],
        )?;

        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        let res = self.http.get(url).send().await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            warn!(%status, "OpenWeather request failed");
            return Err(FetchError::Status { status, body: truncate_body(&body) });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    #[instrument(skip(self), level = "debug")]
    async fn current_weather(&self, coords: Coordinates) -> Result<WeatherSnapshot, FetchError> {
        let url = self.weather_url(coords)?;
        let snapshot: WeatherSnapshot = self.get_json(url).await?;

        debug!(name = %snapshot.name, temp = snapshot.main.temp, "current weather received");
        Ok(snapshot)
    }

    #[instrument(skip(self), level = "debug")]
    async fn reverse_geocode(
        &self,
        coords: Coordinates,
    ) -> Result<Vec<LocationRecord>, FetchError> {
        let url = self.reverse_geocode_url(coords)?;
        let records: Vec<LocationRecord> = self.get_json(url).await?;

        debug!(count = records.len(), "reverse geocode received");
        Ok(records)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
