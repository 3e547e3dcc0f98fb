use async_trait::async_trait;
use std::fmt::Debug;

use crate::{Coordinates, FetchError, LocationRecord, WeatherSnapshot};

pub mod openweather;

pub use openweather::OpenWeatherProvider;

/// The two lookups a refresh cycle issues for a coordinate pair.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current_weather(&self, coords: Coordinates) -> Result<WeatherSnapshot, FetchError>;

    /// Reverse-geocode results, best match first.
    async fn reverse_geocode(&self, coords: Coordinates)
    -> Result<Vec<LocationRecord>, FetchError>;
}
