//! Fakes for the geolocation and provider seams.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::{Barrier, Semaphore};

use crate::{
    Coordinates, FetchError, LocationRecord, PositionError, WeatherSnapshot,
    geolocation::{Geolocator, PositionOptions},
    model::{Condition, MainReadings},
    provider::WeatherProvider,
};

pub(crate) fn taipei() -> Coordinates {
    Coordinates::new(25.033, 121.5654)
}

#[derive(Debug)]
pub(crate) struct FakeGeolocator {
    result: Mutex<Result<Coordinates, PositionError>>,
    calls: AtomicUsize,
    gate: Option<Semaphore>,
}

impl FakeGeolocator {
    pub(crate) fn succeeding(coords: Coordinates) -> Self {
        Self {
            result: Mutex::new(Ok(coords)),
            calls: AtomicUsize::new(0),
            gate: None,
        }
    }

    pub(crate) fn failing(error: PositionError) -> Self {
        Self {
            result: Mutex::new(Err(error)),
            calls: AtomicUsize::new(0),
            gate: None,
        }
    }

    /// Each request blocks until a matching [`release`](Self::release).
    pub(crate) fn gated(mut self) -> Self {
        self.gate = Some(Semaphore::new(0));
        self
    }

    pub(crate) fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub(crate) fn set(&self, result: Result<Coordinates, PositionError>) {
        *self.result.lock() = result;
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Geolocator for FakeGeolocator {
    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<Coordinates, PositionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|_| PositionError::other("gate closed"))?
                .forget();
        }
        self.result.lock().clone()
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeProvider {
    fail_weather: AtomicBool,
    fail_location: AtomicBool,
    weather_calls: AtomicUsize,
    location_calls: AtomicUsize,
    rendezvous: Option<Barrier>,
}

impl FakeProvider {
    /// Both lookups wait for each other before answering.
    pub(crate) fn rendezvous(mut self) -> Self {
        self.rendezvous = Some(Barrier::new(2));
        self
    }

    pub(crate) fn fail_weather(&self, fail: bool) {
        self.fail_weather.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_location(&self, fail: bool) {
        self.fail_location.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn weather_calls(&self) -> usize {
        self.weather_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn location_calls(&self) -> usize {
        self.location_calls.load(Ordering::SeqCst)
    }

    async fn meet(&self) {
        if let Some(barrier) = &self.rendezvous {
            barrier.wait().await;
        }
    }
}

fn unavailable() -> FetchError {
    FetchError::Status {
        status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
        body: "upstream unavailable".into(),
    }
}

#[async_trait]
impl WeatherProvider for FakeProvider {
    async fn current_weather(&self, coords: Coordinates) -> Result<WeatherSnapshot, FetchError> {
        let call = self.weather_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.meet().await;
        if self.fail_weather.load(Ordering::SeqCst) {
            return Err(unavailable());
        }

        Ok(WeatherSnapshot {
            coord: None,
            weather: vec![Condition {
                id: 801,
                main: "Clouds".into(),
                description: "晴，少雲".into(),
                icon: "02d".into(),
            }],
            base: "stations".into(),
            main: MainReadings {
                temp: 26.0 + call as f64,
                feels_like: 28.0,
                temp_min: 25.0,
                temp_max: 29.0,
                pressure: 1011,
                humidity: 70,
                sea_level: None,
                grnd_level: None,
            },
            visibility: Some(10000),
            wind: None,
            rain: None,
            snow: None,
            clouds: None,
            dt: 1_718_000_000,
            sys: None,
            timezone: 28800,
            id: 1_668_341,
            name: format!("{:.2},{:.2}", coords.latitude, coords.longitude),
            cod: 200,
        })
    }

    async fn reverse_geocode(
        &self,
        coords: Coordinates,
    ) -> Result<Vec<LocationRecord>, FetchError> {
        self.location_calls.fetch_add(1, Ordering::SeqCst);
        self.meet().await;
        if self.fail_location.load(Ordering::SeqCst) {
            return Err(unavailable());
        }

        Ok(vec![LocationRecord {
            name: "Taipei".into(),
            local_names: None,
            lat: coords.latitude,
            lon: coords.longitude,
            country: "TW".into(),
            state: None,
        }])
    }
}
