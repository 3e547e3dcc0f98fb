use async_trait::async_trait;

use super::{Geolocator, PositionOptions};
use crate::{Coordinates, PositionError};

/// Always reports the same coordinates, e.g. ones passed on the command line.
#[derive(Debug, Clone, Copy)]
pub struct FixedGeolocator {
    coordinates: Coordinates,
}

impl FixedGeolocator {
    pub fn new(coordinates: Coordinates) -> Self {
        Self { coordinates }
    }
}

#[async_trait]
impl Geolocator for FixedGeolocator {
    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<Coordinates, PositionError> {
        let Coordinates { latitude, longitude } = self.coordinates;
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(PositionError::other(format!(
                "Coordinates out of range: {latitude}, {longitude}"
            )));
        }
        Ok(self.coordinates)
    }
}
