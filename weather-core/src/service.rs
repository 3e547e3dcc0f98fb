use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tracing::{info, instrument, warn};

use crate::{
    Coordinates, PositionError, WeatherState, geolocation::PositionAcquirer,
    permission::RefreshNotifier, provider::WeatherProvider,
};

/// Result of issuing both lookups for one coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOutcome {
    pub weather_ok: bool,
    pub location_ok: bool,
}

impl FetchOutcome {
    pub fn is_complete(&self) -> bool {
        self.weather_ok && self.location_ok
    }
}

/// Acquires the current position and resolves it to weather and a place name.
///
/// State is published through a `watch` channel; each mutation is visible to
/// every [`subscribe`](Self::subscribe)r. Overlapping `refresh`/`refetch`
/// calls run one after another, in call order.
#[derive(Debug)]
pub struct LocationWeatherService {
    acquirer: PositionAcquirer,
    provider: Arc<dyn WeatherProvider>,
    state: watch::Sender<WeatherState>,
    in_flight: Mutex<()>,
    notifier: RefreshNotifier,
}

/// Clears `acquiring_position` however the refresh exits, including when the
/// future is dropped mid-flight.
struct AcquiringGuard<'a>(&'a watch::Sender<WeatherState>);

impl Drop for AcquiringGuard<'_> {
    fn drop(&mut self) {
        self.0.send_modify(|s| s.acquiring_position = false);
    }
}

impl LocationWeatherService {
    pub fn new(acquirer: PositionAcquirer, provider: Arc<dyn WeatherProvider>) -> Self {
        let (state, _) = watch::channel(WeatherState::default());
        Self {
            acquirer,
            provider,
            state,
            in_flight: Mutex::new(()),
            notifier: RefreshNotifier::default(),
        }
    }

    /// Current state snapshot.
    pub fn state(&self) -> WeatherState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<WeatherState> {
        self.state.subscribe()
    }

    pub(crate) fn has_location_error(&self) -> bool {
        self.state.borrow().location_error.is_some()
    }

    pub(crate) fn clear_location_error(&self) {
        self.state.send_modify(|s| s.location_error = None);
    }

    /// Registers the callback fired after a permission-triggered refresh
    /// succeeds. Replaces any earlier registration.
    pub fn on_data_refreshed<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.notifier.register(callback);
    }

    pub(crate) fn notifier(&self) -> &RefreshNotifier {
        &self.notifier
    }

    /// Gets the current location, then its weather and place name.
    ///
    /// Position failures are recorded in the error slot and returned. Fetch
    /// failures are only recorded; the call still returns `Ok`.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<(), PositionError> {
        let _turn = self.in_flight.lock().await;

        self.state.send_modify(|s| {
            s.acquiring_position = true;
            s.location_error = None;
            s.weather_fetch_error = None;
            s.location_fetch_error = None;
        });
        let _acquiring = AcquiringGuard(&self.state);

        let coords = match self.acquirer.acquire_current_position().await {
            Ok(coords) => coords,
            Err(e) => {
                let message = e.user_message();
                self.state.send_modify(|s| s.location_error = Some(message));
                return Err(e);
            }
        };

        self.state.send_modify(|s| s.coordinates = Some(coords));

        let outcome = self.fetch_all(coords).await;
        if outcome.is_complete() {
            let now = Utc::now();
            self.state.send_modify(|s| s.last_updated = Some(now));
            info!(lat = coords.latitude, lon = coords.longitude, "weather refreshed");
        } else {
            warn!(?outcome, "weather refresh finished with fetch errors");
        }

        Ok(())
    }

    /// Re-issues both lookups for the last known coordinates without asking
    /// for a new position. Returns `None` when no position was acquired yet.
    #[instrument(skip(self))]
    pub async fn refetch(&self) -> Option<FetchOutcome> {
        let _turn = self.in_flight.lock().await;

        let coordinates = self.state.borrow().coordinates;
        let Some(coords) = coordinates else {
            warn!("refetch requested before any position was acquired");
            return None;
        };

        Some(self.fetch_all(coords).await)
    }

    /// Both lookups run concurrently; neither failure cancels the other.
    async fn fetch_all(&self, coords: Coordinates) -> FetchOutcome {
        self.state.send_modify(|s| {
            s.fetching_weather = true;
            s.fetching_location = true;
            s.weather_fetch_error = None;
            s.location_fetch_error = None;
        });

        let (weather_ok, location_ok) =
            tokio::join!(self.fetch_weather(coords), self.fetch_location(coords));

        FetchOutcome {
            weather_ok,
            location_ok,
        }
    }

    async fn fetch_weather(&self, coords: Coordinates) -> bool {
        let result = self.provider.current_weather(coords).await;
        let ok = result.is_ok();

        self.state.send_modify(|s| {
            s.fetching_weather = false;
            match result {
                Ok(snapshot) => s.weather = Some(snapshot),
                Err(e) => {
                    warn!(error = %e, "weather fetch failed");
                    s.weather_fetch_error = Some(e.to_string());
                }
            }
        });

        ok
    }

    async fn fetch_location(&self, coords: Coordinates) -> bool {
        let result = self.provider.reverse_geocode(coords).await;
        let ok = result.is_ok();

        self.state.send_modify(|s| {
            s.fetching_location = false;
            match result {
                Ok(records) => s.locations = Some(records),
                Err(e) => {
                    warn!(error = %e, "reverse geocode failed");
                    s.location_fetch_error = Some(e.to_string());
                }
            }
        });

        ok
    }
}
