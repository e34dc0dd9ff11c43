use crate::model::LocationQuery;
use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;

pub mod openweather;

pub use openweather::OpenWeatherProvider;

/// Provider resources the proxy forwards to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Current,
    Forecast,
}

impl Endpoint {
    /// Path segment on the provider side.
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Current => "weather",
            Endpoint::Forecast => "forecast",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a provider call failed, tagged where the failure happens.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider responded with status {status}: {body}")]
    Status {
        status: u16,
        retry_after: Option<String>,
        body: String,
    },

    #[error("provider request timed out")]
    Timeout,

    #[error("provider unreachable: {0}")]
    Unreachable(String),

    #[error("provider request failed: {0}")]
    Other(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else if err.is_connect() {
            ProviderError::Unreachable(err.to_string())
        } else {
            ProviderError::Other(err.to_string())
        }
    }
}

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Fetch the provider's JSON for `endpoint` unchanged.
    async fn fetch(
        &self,
        endpoint: Endpoint,
        query: &LocationQuery,
    ) -> Result<serde_json::Value, ProviderError>;
}
