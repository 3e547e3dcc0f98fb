//! Approximate geolocation from the caller's public IP address (ip-api.com).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{Geolocator, PositionOptions};
use crate::{Coordinates, PositionError};

const IP_API_URL: &str = "http://ip-api.com/json/";

#[derive(Debug, Clone)]
pub struct IpApiGeolocator {
    endpoint: String,
    http: Client,
}

impl IpApiGeolocator {
    pub fn new() -> Self {
        Self::with_endpoint(IP_API_URL)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into(), http: Client::new() }
    }
}

impl Default for IpApiGeolocator {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
}

#[async_trait]
impl Geolocator for IpApiGeolocator {
    async fn current_position(
        &self,
        options: &PositionOptions,
    ) -> Result<Coordinates, PositionError> {
        // An IP lookup has no accuracy knob and is never served from a cache.
        let res = self
            .http
            .get(&self.endpoint)
            .query(&[("fields", "status,message,lat,lon")])
            .timeout(options.timeout)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = res.status();
        if !status.is_success() {
            warn!(%status, "IP geolocation request rejected");
            return Err(PositionError::PositionUnavailable);
        }

        let body: IpApiResponse = res.json().await.map_err(classify_transport_error)?;

        match (body.status.as_str(), body.lat, body.lon) {
            ("success", Some(lat), Some(lon)) => {
                debug!(lat, lon, "IP geolocation resolved");
                Ok(Coordinates::new(lat, lon))
            }
            _ => {
                warn!(
                    status = %body.status,
                    message = body.message.as_deref().unwrap_or_default(),
                    "IP geolocation lookup failed"
                );
                Err(PositionError::PositionUnavailable)
            }
        }
    }
}

fn classify_transport_error(err: reqwest::Error) -> PositionError {
    if err.is_timeout() {
        PositionError::Timeout
    } else {
        warn!(error = %err, "IP geolocation transport error");
        PositionError::PositionUnavailable
    }
}
