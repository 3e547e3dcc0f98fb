//! Core library for the `simple-weather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Position acquisition behind a geolocation abstraction
//! - The OpenWeather current-weather and reverse-geocode lookups
//! - [`LocationWeatherService`], which chains the above and publishes
//!   observable state plus derived display values
//!
//! It is used by `simple-weather-cli`, but can also be reused by other front ends.

pub mod config;
pub mod display;
pub mod error;
pub mod geolocation;
pub mod model;
pub mod permission;
pub mod provider;
pub mod service;

#[cfg(test)]
mod testing;

pub use config::{ApiMode, Config, Endpoints};
pub use display::WeatherSummary;
pub use error::{FetchError, PositionError};
pub use geolocation::{FixedGeolocator, Geolocator, IpApiGeolocator, PositionAcquirer};
pub use model::{Coordinates, LocationRecord, WeatherSnapshot, WeatherState};
pub use permission::{PermissionState, RefreshNotifier, observe_permission};
pub use provider::{OpenWeatherProvider, WeatherProvider};
pub use service::{FetchOutcome, LocationWeatherService};
