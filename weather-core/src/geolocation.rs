use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc, time::Duration};
use tracing::{debug, instrument, warn};

use crate::{Coordinates, PositionError};

pub mod fixed;
pub mod ip_api;

pub use fixed::FixedGeolocator;
pub use ip_api::IpApiGeolocator;

/// Options handed to the platform for a single position request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest cached fix the platform may return. Zero forces a fresh fix.
    pub maximum_age: Duration,
}

impl PositionOptions {
    pub const FRESH_HIGH_ACCURACY: PositionOptions = PositionOptions {
        enable_high_accuracy: true,
        timeout: Duration::from_secs(10),
        maximum_age: Duration::ZERO,
    };
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self::FRESH_HIGH_ACCURACY
    }
}

/// Platform capability that produces a single position fix.
#[async_trait]
pub trait Geolocator: Send + Sync + Debug {
    async fn current_position(&self, options: &PositionOptions)
    -> Result<Coordinates, PositionError>;
}

/// Single-shot position requests with fixed options.
#[derive(Debug, Clone)]
pub struct PositionAcquirer {
    geolocator: Option<Arc<dyn Geolocator>>,
    options: PositionOptions,
}

impl PositionAcquirer {
    pub fn new(geolocator: Arc<dyn Geolocator>) -> Self {
        Self {
            geolocator: Some(geolocator),
            options: PositionOptions::FRESH_HIGH_ACCURACY,
        }
    }

    /// An acquirer for a platform with no geolocation support.
    pub fn unavailable() -> Self {
        Self {
            geolocator: None,
            options: PositionOptions::FRESH_HIGH_ACCURACY,
        }
    }

    pub fn options(&self) -> &PositionOptions {
        &self.options
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn acquire_current_position(&self) -> Result<Coordinates, PositionError> {
        let Some(geolocator) = &self.geolocator else {
            warn!("no geolocation capability available");
            return Err(PositionError::CapabilityUnavailable);
        };

        let request = geolocator.current_position(&self.options);
        let result = match tokio::time::timeout(self.options.timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(PositionError::Timeout),
        };

        match &result {
            Ok(coords) => {
                debug!(lat = coords.latitude, lon = coords.longitude, "position acquired")
            }
            Err(e) => warn!(error = %e, "position acquisition failed"),
        }

        result
    }
}
