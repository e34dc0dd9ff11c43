use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::{
    error::ClientError,
    model::{CurrentWeather, ForecastEntry, LocationQuery},
    provider::openweather::{parse_current, parse_forecast},
};

/// The SkyWatch proxy as seen by the client.
#[async_trait]
pub trait WeatherBackend: Send + Sync {
    async fn current(&self, query: &LocationQuery) -> Result<CurrentWeather, ClientError>;
    async fn forecast(&self, query: &LocationQuery) -> Result<Vec<ForecastEntry>, ClientError>;
}

/// Error body returned by the proxy.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    retry_after: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    http: Client,
    timeout: Duration,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
            timeout,
        }
    }

    /// GET `path`, bounded by the request timeout. Dropping the inner future
    /// on expiry aborts the call.
    async fn get(&self, path: &str, query: &LocationQuery) -> Result<String, ClientError> {
        match tokio::time::timeout(self.timeout, self.get_unbounded(path, query)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(path, %query, "backend request timed out");
                Err(ClientError::Timeout)
            }
        }
    }

    async fn get_unbounded(&self, path: &str, query: &LocationQuery) -> Result<String, ClientError> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(%url, %query, "requesting backend");

        let res = self
            .http
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&query.backend_params())
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        if !status.is_success() {
            let parsed: ErrorBody = serde_json::from_str(&body).unwrap_or_default();
            warn!(path, status = status.as_u16(), details = ?parsed.details, "backend returned an error");
            return Err(ClientError::upstream(
                status.as_u16(),
                parsed.details,
                parsed.retry_after,
            ));
        }

        Ok(body)
    }
}

#[async_trait]
impl WeatherBackend for HttpBackend {
    async fn current(&self, query: &LocationQuery) -> Result<CurrentWeather, ClientError> {
        let body = self.get("weather", query).await?;
        parse_current(&body).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    async fn forecast(&self, query: &LocationQuery) -> Result<Vec<ForecastEntry>, ClientError> {
        let body = self.get("forecast", query).await?;
        parse_forecast(&body).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }
}
