/// HTTP request handlers
use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use skywatch_core::{Endpoint, LocationQuery, WeatherProvider};
use std::{sync::Arc, time::Instant};
use tracing::{debug, error, warn};

use crate::{
    errors::{ApiError, ApiResult},
    rate_limit::RateLimiter,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// `None` when no provider key is configured.
    pub provider: Option<Arc<dyn WeatherProvider>>,
    pub limiter: Arc<RateLimiter>,
    pub started: Instant,
    pub environment: String,
}

impl AppState {
    pub fn new(
        provider: Option<Arc<dyn WeatherProvider>>,
        limiter: RateLimiter,
        environment: String,
    ) -> Self {
        Self {
            provider,
            limiter: Arc::new(limiter),
            started: Instant::now(),
            environment,
        }
    }
}

/// `city=` or `lat=&lon=`, kept as strings so bad numbers get our own 400.
#[derive(Debug, Default, Deserialize)]
pub struct LocationParams {
    pub city: Option<String>,
    pub lat: Option<String>,
    pub lon: Option<String>,
}

impl LocationParams {
    pub fn into_query(self, endpoint: Endpoint) -> ApiResult<LocationQuery> {
        let present = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        if let Some(city) = present(self.city) {
            return Ok(LocationQuery::City(city));
        }

        match (present(self.lat), present(self.lon)) {
            (Some(lat), Some(lon)) => {
                let lat: f64 = lat.parse().map_err(|_| ApiError::InvalidCoordinates)?;
                let lon: f64 = lon.parse().map_err(|_| ApiError::InvalidCoordinates)?;
                if !lat.is_finite() || !lon.is_finite() {
                    return Err(ApiError::InvalidCoordinates);
                }
                Ok(LocationQuery::Coordinates { lat, lon })
            }
            _ => Err(ApiError::MissingLocation(endpoint)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    /// Seconds since start.
    pub uptime: f64,
    pub environment: String,
}

/// Health check handler
pub async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "OK",
        timestamp: Utc::now(),
        uptime: state.started.elapsed().as_secs_f64(),
        environment: state.environment.clone(),
    })
}

/// Current weather, passed through from the provider
pub async fn weather(
    State(state): State<AppState>,
    params: Result<Query<LocationParams>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    proxy(&state, Endpoint::Current, params).await
}

/// 5-day / 3-hour forecast, passed through from the provider
pub async fn forecast(
    State(state): State<AppState>,
    params: Result<Query<LocationParams>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    proxy(&state, Endpoint::Forecast, params).await
}

async fn proxy(
    state: &AppState,
    endpoint: Endpoint,
    params: Result<Query<LocationParams>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let Query(params) = params.map_err(|e| {
        debug!(error = %e, "unparsable query string");
        ApiError::InvalidQuery(endpoint)
    })?;
    let query = params.into_query(endpoint)?;

    let provider = state.provider.as_ref().ok_or_else(|| {
        error!("OpenWeatherMap API key not found in environment variables");
        ApiError::NotConfigured
    })?;

    match provider.fetch(endpoint, &query).await {
        Ok(body) => Ok(Json(body)),
        Err(e) => {
            warn!(%endpoint, %query, error = %e, "provider request failed");
            Err(e.into())
        }
    }
}

/// Unknown routes
pub async fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Endpoint not found",
            "message": "The requested endpoint does not exist.",
            "availableEndpoints": {
                "GET /health": "Health check endpoint",
                "GET /weather": "Current weather data (query params: city OR lat,lon)",
                "GET /forecast": "5-day forecast data (query params: city OR lat,lon)",
            }
        })),
    )
}
