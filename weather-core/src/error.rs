use thiserror::Error;

const GENERIC_POSITION_MESSAGE: &str = "Unable to get your location";

/// Why a position fix could not be obtained.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error("Geolocation is not supported on this platform")]
    CapabilityUnavailable,

    #[error("You denied access to your location")]
    PermissionDenied,

    #[error("Your location information is unavailable")]
    PositionUnavailable,

    #[error("Timed out while getting your location, please try again later")]
    Timeout,

    /// Unclassified failure, carrying the underlying message if there was one.
    #[error("{}", other_message(.0))]
    Other(Option<String>),
}

impl PositionError {
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(Some(message.into()))
    }

    /// Message written into the shared error slot.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

fn other_message(message: &Option<String>) -> &str {
    match message.as_deref() {
        Some(m) if !m.is_empty() => m,
        _ => GENERIC_POSITION_MESSAGE,
    }
}

/// Failure of one of the two HTTP lookups.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Network error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Request failed with status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}
