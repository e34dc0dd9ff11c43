//! Client-side error taxonomy.
//!
//! Each variant is produced where the failure happens; the message shown to
//! the user comes from [`ClientError::user_message`], never from parsing
//! another error's text.

use thiserror::Error;

/// Device geolocation failures.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeolocationError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("location unavailable")]
    PositionUnavailable,

    #[error("location request timed out")]
    Timeout,

    #[error("geolocation not supported")]
    Unsupported,
}

impl GeolocationError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::PermissionDenied => {
                "Location access denied. Please allow location access or search for a city instead."
            }
            Self::PositionUnavailable => {
                "Location unavailable. Please try again or search for a city instead."
            }
            Self::Timeout => {
                "Location request timed out. Please try again or search for a city instead."
            }
            Self::Unsupported => {
                "Geolocation is not supported on this device. Please search for a city instead."
            }
        }
    }
}

/// Backend HTTP statuses the client knows how to explain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamKind {
    BadRequest,
    NotFound,
    RateLimited,
    ServerError,
    ServiceUnavailable,
    GatewayTimeout,
    Other,
}

impl UpstreamKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => Self::BadRequest,
            404 => Self::NotFound,
            429 => Self::RateLimited,
            500 => Self::ServerError,
            502 | 503 => Self::ServiceUnavailable,
            504 => Self::GatewayTimeout,
            _ => Self::Other,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    #[error("empty city name")]
    EmptyCity,

    #[error(transparent)]
    Geolocation(#[from] GeolocationError),

    #[error("a location request is already in progress")]
    LocationInProgress,

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("backend responded with status {status}")]
    Upstream {
        kind: UpstreamKind,
        status: u16,
        details: Option<String>,
        retry_after: Option<u64>,
    },

    #[error("invalid response from backend: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    pub fn upstream(status: u16, details: Option<String>, retry_after: Option<u64>) -> Self {
        Self::Upstream {
            kind: UpstreamKind::from_status(status),
            status,
            details,
            retry_after,
        }
    }

    /// Text shown in the error state.
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyCity => "Please enter a city name.".to_string(),
            Self::Geolocation(e) => e.user_message().to_string(),
            Self::LocationInProgress => "Location request already in progress.".to_string(),
            Self::Network(_) => "Network error. Please check your internet connection and ensure the backend server is running.".to_string(),
            Self::Timeout => {
                "Request timed out. Please check your internet connection and try again."
                    .to_string()
            }
            Self::Upstream { kind, status, .. } => match kind {
                UpstreamKind::BadRequest => {
                    "Invalid request. Please check your input and try again.".to_string()
                }
                UpstreamKind::NotFound => {
                    "City not found. Please check the spelling and try again.".to_string()
                }
                UpstreamKind::RateLimited => {
                    "Too many requests. Please wait a moment and try again.".to_string()
                }
                UpstreamKind::ServerError => "Server error. Please try again later.".to_string(),
                UpstreamKind::ServiceUnavailable => {
                    "Weather service temporarily unavailable. Please try again later.".to_string()
                }
                UpstreamKind::GatewayTimeout => "Request timeout. Please try again.".to_string(),
                UpstreamKind::Other => {
                    format!("Request failed with status {status}. Please try again.")
                }
            },
            Self::InvalidResponse(_) => {
                "Received an unexpected response from the weather service.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_table() {
        assert_eq!(UpstreamKind::from_status(400), UpstreamKind::BadRequest);
        assert_eq!(UpstreamKind::from_status(404), UpstreamKind::NotFound);
        assert_eq!(UpstreamKind::from_status(429), UpstreamKind::RateLimited);
        assert_eq!(UpstreamKind::from_status(500), UpstreamKind::ServerError);
        assert_eq!(UpstreamKind::from_status(502), UpstreamKind::ServiceUnavailable);
        assert_eq!(UpstreamKind::from_status(503), UpstreamKind::ServiceUnavailable);
        assert_eq!(UpstreamKind::from_status(504), UpstreamKind::GatewayTimeout);
        assert_eq!(UpstreamKind::from_status(418), UpstreamKind::Other);
    }

    #[test]
    fn messages_ignore_backend_details() {
        let err = ClientError::upstream(404, Some("something else".into()), None);
        assert_eq!(
            err.user_message(),
            "City not found. Please check the spelling and try again."
        );
    }

    #[test]
    fn unknown_status_mentions_code() {
        let err = ClientError::upstream(418, None, None);
        assert!(err.user_message().contains("418"));
    }

    #[test]
    fn timeout_and_network_are_distinct() {
        assert_ne!(
            ClientError::Timeout.user_message(),
            ClientError::Network("refused".into()).user_message()
        );
    }

    #[test]
    fn geolocation_messages_are_distinct() {
        let all = [
            GeolocationError::PermissionDenied,
            GeolocationError::PositionUnavailable,
            GeolocationError::Timeout,
            GeolocationError::Unsupported,
        ];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a.user_message(), b.user_message());
            }
        }
    }
}
